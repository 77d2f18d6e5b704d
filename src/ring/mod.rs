// Wait-free single-producer/single-consumer ring buffer connecting pipeline
// stages. Exactly one thread may call `push`; exactly one thread may call
// `pop`. Head and tail counters live on separate cache lines to avoid false
// sharing between the producer and consumer cores.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

const CACHE_LINE: usize = 64;

#[repr(align(64))]
struct CachePadded<T>(T);

/// Fixed-capacity SPSC queue. Capacity must be a power of two; `new` rounds
/// up if it isn't.
pub struct SpscRing<T> {
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
    mask: usize,
    buf: Box<[UnsafeCell<Option<T>>]>,
    dropped: AtomicUsize,
}

unsafe impl<T: Send> Send for SpscRing<T> {}
unsafe impl<T: Send> Sync for SpscRing<T> {}

impl<T> SpscRing<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.next_power_of_two().max(2);
        let mut buf = Vec::with_capacity(capacity);
        buf.resize_with(capacity, || UnsafeCell::new(None));
        Self {
            head: CachePadded(AtomicUsize::new(0)),
            tail: CachePadded(AtomicUsize::new(0)),
            mask: capacity - 1,
            buf: buf.into_boxed_slice(),
            dropped: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Number of pushes that were dropped because the ring was full.
    pub fn dropped_count(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Producer-only. Returns `false` without blocking if the ring is full.
    pub fn push(&self, value: T) -> bool {
        let head = self.head.0.load(Ordering::Relaxed);
        let tail = self.tail.0.load(Ordering::Acquire);
        if head.wrapping_sub(tail) > self.mask {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        let idx = head & self.mask;
        // SAFETY: only the producer thread writes slot `idx`, and this slot
        // was vacated by the consumer before `tail` advanced past it.
        unsafe {
            *self.buf[idx].get() = Some(value);
        }
        self.head.0.store(head.wrapping_add(1), Ordering::Release);
        true
    }

    /// Consumer-only. Returns `false` without blocking if the ring is empty.
    pub fn pop(&self) -> Option<T> {
        let tail = self.tail.0.load(Ordering::Relaxed);
        let head = self.head.0.load(Ordering::Acquire);
        if tail == head {
            return None;
        }
        let idx = tail & self.mask;
        // SAFETY: only the consumer thread reads/clears slot `idx`, and the
        // producer has already published it via the Release store above.
        let value = unsafe { (*self.buf[idx].get()).take() };
        self.tail.0.store(tail.wrapping_add(1), Ordering::Release);
        value
    }

    pub fn is_empty(&self) -> bool {
        self.tail.0.load(Ordering::Acquire) == self.head.0.load(Ordering::Acquire)
    }
}

const _: () = assert!(std::mem::align_of::<CachePadded<AtomicUsize>>() == CACHE_LINE);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn rounds_capacity_up_to_power_of_two() {
        let ring: SpscRing<u32> = SpscRing::new(100);
        assert_eq!(ring.capacity(), 128);
    }

    #[test]
    fn push_pop_preserves_order() {
        let ring: SpscRing<u32> = SpscRing::new(8);
        for i in 0..8 {
            assert!(ring.push(i));
        }
        assert!(!ring.push(99), "ring should report full at capacity");
        for i in 0..8 {
            assert_eq!(ring.pop(), Some(i));
        }
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn full_push_increments_dropped_counter() {
        let ring: SpscRing<u32> = SpscRing::new(2);
        assert!(ring.push(1));
        assert!(ring.push(2));
        assert!(!ring.push(3));
        assert_eq!(ring.dropped_count(), 1);
    }

    #[test]
    fn cross_thread_push_pop_preserves_order() {
        const N: u32 = 100_000;
        let ring = Arc::new(SpscRing::<u32>::new(1024));
        let running = Arc::new(AtomicBool::new(true));

        let producer_ring = Arc::clone(&ring);
        let producer = thread::spawn(move || {
            let mut i = 0u32;
            while i < N {
                if producer_ring.push(i) {
                    i += 1;
                } else {
                    thread::yield_now();
                }
            }
        });

        let consumer_ring = Arc::clone(&ring);
        let consumer_running = Arc::clone(&running);
        let consumer = thread::spawn(move || {
            let mut expected = 0u32;
            while expected < N {
                match consumer_ring.pop() {
                    Some(v) => {
                        assert_eq!(v, expected);
                        expected += 1;
                    }
                    None => {
                        if !consumer_running.load(Ordering::Acquire) {
                            break;
                        }
                        thread::yield_now();
                    }
                }
            }
            expected
        });

        producer.join().unwrap();
        running.store(false, Ordering::Release);
        let consumed = consumer.join().unwrap();
        assert_eq!(consumed, N);
    }
}
