use num_complex::Complex64;

use crate::prelude::StageError;

/// Bounded pool of complex scratch rows for the per-row transforms.
pub struct BufferPool {
    buffers: Vec<Vec<Complex64>>,
    outstanding: usize,
    max_capacity: usize,
}

impl BufferPool {
    pub fn with_capacity(max_capacity: usize) -> Self {
        Self {
            buffers: Vec::with_capacity(max_capacity),
            outstanding: 0,
            max_capacity,
        }
    }

    /// Hands out a zeroed buffer of `length`, reusing a released one if possible.
    pub fn checkout(&mut self, length: usize) -> Result<Vec<Complex64>, StageError> {
        if self.outstanding >= self.max_capacity {
            return Err(StageError::BufferExhaustion(format!(
                "all {} buffers checked out",
                self.max_capacity
            )));
        }
        let mut buffer = self.buffers.pop().unwrap_or_default();
        buffer.clear();
        buffer.resize(length, Complex64::new(0.0, 0.0));
        self.outstanding += 1;
        Ok(buffer)
    }

    /// Returns a buffer back to the pool for reuse.
    pub fn release(&mut self, mut buffer: Vec<Complex64>) {
        self.outstanding = self.outstanding.saturating_sub(1);
        buffer.clear();
        if self.buffers.len() < self.max_capacity {
            self.buffers.push(buffer);
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn reset(&mut self) {
        self.buffers.clear();
        self.outstanding = 0;
    }
}
