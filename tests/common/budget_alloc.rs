use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Global allocator that tracks live bytes, peak bytes and allocation count.
pub struct BudgetAlloc {
    current: AtomicUsize,
    peak: AtomicUsize,
    count: AtomicUsize,
}

/// Counters captured after one measured closure.
#[derive(Clone, Copy, Debug)]
pub struct BudgetSample {
    pub peak_bytes: usize,
    pub retained_bytes: usize,
    pub allocs: usize,
}

impl BudgetSample {
    pub fn peak_kib(&self) -> f64 {
        self.peak_bytes as f64 / 1024.0
    }
}

impl BudgetAlloc {
    pub const fn new() -> Self {
        Self {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            count: AtomicUsize::new(0),
        }
    }

    pub fn reset(&self) {
        self.current.store(0, Ordering::SeqCst);
        self.peak.store(0, Ordering::SeqCst);
        self.count.store(0, Ordering::SeqCst);
    }

    /// Restart peak tracking from the bytes currently live.
    pub fn reset_peak(&self) {
        self.peak.store(self.current_bytes(), Ordering::SeqCst);
    }

    pub fn peak_bytes(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn current_bytes(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn alloc_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset, run `f`, and sample the counters while its result is still alive.
    pub fn measure<T>(&self, f: impl FnOnce() -> T) -> (T, BudgetSample) {
        self.reset();
        let out = f();
        let sample = BudgetSample {
            peak_bytes: self.peak_bytes(),
            retained_bytes: self.current_bytes(),
            allocs: self.alloc_count(),
        };
        (out, sample)
    }

    fn grow(&self, bytes: usize) {
        let now = self.current.fetch_add(bytes, Ordering::SeqCst) + bytes;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn shrink(&self, bytes: usize) {
        let _ = self
            .current
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_sub(bytes))
            });
    }

    fn record(&self, ptr: *mut u8, bytes: usize) -> *mut u8 {
        if !ptr.is_null() {
            self.grow(bytes);
            self.count.fetch_add(1, Ordering::SeqCst);
        }
        ptr
    }
}

unsafe impl GlobalAlloc for BudgetAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        self.record(unsafe { System.alloc(layout) }, layout.size())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        self.shrink(layout.size());
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        self.record(unsafe { System.alloc_zeroed(layout) }, layout.size())
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            if new_size >= layout.size() {
                self.grow(new_size - layout.size());
            } else {
                self.shrink(layout.size() - new_size);
            }
            self.count.fetch_add(1, Ordering::SeqCst);
        }
        new_ptr
    }
}
