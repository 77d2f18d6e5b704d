// Simulated hardware quoting offload. Backs a fixed register block with a
// real anonymous memory mapping so the read/write path exercises the same
// volatile-style access pattern a userspace FPGA driver would use, without
// needing actual hardware in this environment.

use memmap2::{MmapMut, MmapOptions};

use crate::types::{Side, StrategyOrder};

const REGISTER_BLOCK_SIZE: usize = 4096;

const REG_COMMAND: usize = 0x00;
const REG_HEARTBEAT: usize = 0x08;
pub(crate) const REG_BASE_SKEW: usize = 0x10;
const REG_RISK_AVERSION: usize = 0x18;
const REG_MAX_POS_LIMIT: usize = 0x20;
const REG_MIN_SPREAD: usize = 0x28;
const REG_FPGA_INVENTORY: usize = 0x30;
const REG_EXECUTION_COUNT: usize = 0x38;
const REG_ORDER_INJECT_TRIGGER: usize = 0x40;
const REG_ORDER_INJECT_PX: usize = 0x48;
const REG_ORDER_INJECT_QTY: usize = 0x50;
const REG_ORDER_INJECT_SIDE: usize = 0x58;

#[derive(Debug)]
pub struct RegisterOutOfBoundsError {
    pub offset: usize,
}

/// Owns the simulated register block and the narrow read/write primitives
/// over it. All registers are 8 bytes wide, little-endian.
pub struct HardwareDriver {
    registers: MmapMut,
}

impl HardwareDriver {
    pub fn new() -> std::io::Result<Self> {
        let registers = MmapOptions::new().len(REGISTER_BLOCK_SIZE).map_anon()?;
        Ok(Self { registers })
    }

    pub fn write_reg(&mut self, offset: usize, value: u64) -> Result<(), RegisterOutOfBoundsError> {
        if offset + 8 > self.registers.len() {
            return Err(RegisterOutOfBoundsError { offset });
        }
        self.registers[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn read_reg(&self, offset: usize) -> Result<u64, RegisterOutOfBoundsError> {
        if offset + 8 > self.registers.len() {
            return Err(RegisterOutOfBoundsError { offset });
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.registers[offset..offset + 8]);
        Ok(u64::from_le_bytes(bytes))
    }

    fn write_reg_i64(&mut self, offset: usize, value: i64) -> Result<(), RegisterOutOfBoundsError> {
        self.write_reg(offset, value as u64)
    }

    pub(crate) fn read_reg_i64(&self, offset: usize) -> Result<i64, RegisterOutOfBoundsError> {
        self.read_reg(offset).map(|v| v as i64)
    }

    pub fn heartbeat(&self) -> Result<u64, RegisterOutOfBoundsError> {
        self.read_reg(REG_HEARTBEAT)
    }

    pub fn execution_count(&self) -> Result<u64, RegisterOutOfBoundsError> {
        self.read_reg(REG_EXECUTION_COUNT)
    }

    pub fn fpga_inventory(&self) -> Result<i64, RegisterOutOfBoundsError> {
        self.read_reg_i64(REG_FPGA_INVENTORY)
    }

    /// Pushes the strategy's current risk-aversion, volatility-derived skew,
    /// and position limit down to the offloaded quoting logic. Values are
    /// carried in the same fixed-point scale used throughout the pipeline.
    pub fn update_strategy_params(&mut self, base_skew: i64, gamma: i64, max_pos_limit: i64) -> Result<(), RegisterOutOfBoundsError> {
        self.write_reg_i64(REG_BASE_SKEW, base_skew)?;
        self.write_reg(REG_RISK_AVERSION, gamma as u64)?;
        self.write_reg(REG_MAX_POS_LIMIT, max_pos_limit as u64)?;
        Ok(())
    }

    pub fn update_min_spread(&mut self, min_spread: i64) -> Result<(), RegisterOutOfBoundsError> {
        self.write_reg(REG_MIN_SPREAD, min_spread as u64)
    }

    /// Injects an order directly into the simulated hardware path: writes
    /// price/quantity/side, then the trigger, then bumps the execution
    /// counter to mimic the card acknowledging the inject.
    pub fn send_order(&mut self, order: &StrategyOrder) -> Result<(), RegisterOutOfBoundsError> {
        self.write_reg(REG_ORDER_INJECT_PX, order.price.raw() as u64)?;
        self.write_reg(REG_ORDER_INJECT_QTY, order.quantity as u64)?;
        let side_code = match order.side {
            Side::Buy => 1u64,
            Side::Sell => 2u64,
        };
        self.write_reg(REG_ORDER_INJECT_SIDE, side_code)?;
        self.write_reg(REG_ORDER_INJECT_TRIGGER, 1)?;

        let count = self.read_reg(REG_EXECUTION_COUNT)?;
        self.write_reg(REG_EXECUTION_COUNT, count + 1)?;
        Ok(())
    }

    pub fn send_command(&mut self, command: u64) -> Result<(), RegisterOutOfBoundsError> {
        self.write_reg(REG_COMMAND, command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixed_point::SCALE;
    use crate::types::{OrderAction, OrderType, Price};

    #[test]
    fn register_block_round_trips_u64() {
        let mut drv = HardwareDriver::new().unwrap();
        drv.write_reg(REG_HEARTBEAT, 42).unwrap();
        assert_eq!(drv.read_reg(REG_HEARTBEAT).unwrap(), 42);
    }

    #[test]
    fn negative_skew_round_trips_as_i64() {
        let mut drv = HardwareDriver::new().unwrap();
        drv.update_strategy_params(-500, 250, 10_000).unwrap();
        assert_eq!(drv.read_reg_i64(REG_BASE_SKEW).unwrap(), -500);
    }

    #[test]
    fn send_order_writes_fields_and_bumps_execution_count() {
        let mut drv = HardwareDriver::new().unwrap();
        let order = StrategyOrder {
            action: OrderAction::New,
            client_order_id: 1,
            symbol_id: 1,
            side: Side::Sell,
            price: Price::new(1_000_000),
            quantity: 50,
            order_type: OrderType::Limit,
        };
        drv.send_order(&order).unwrap();
        assert_eq!(drv.read_reg(REG_ORDER_INJECT_PX).unwrap(), 1_000_000);
        assert_eq!(drv.read_reg(REG_ORDER_INJECT_QTY).unwrap(), 50);
        assert_eq!(drv.read_reg(REG_ORDER_INJECT_SIDE).unwrap(), 2);
        assert_eq!(drv.read_reg(REG_ORDER_INJECT_TRIGGER).unwrap(), 1);
        assert_eq!(drv.execution_count().unwrap(), 1);
    }

    #[test]
    fn out_of_bounds_offset_is_rejected() {
        let drv = HardwareDriver::new().unwrap();
        assert!(drv.read_reg(REGISTER_BLOCK_SIZE - 4).is_err());
    }

    #[test]
    fn scale_constant_matches_fixed_point_scale() {
        assert_eq!(SCALE, 10_000);
    }
}
