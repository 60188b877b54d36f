//! Trailing window strategy feeding slices to primitives.

/// Fixed-length trailing window (e.g. rolling std-dev of returns).
#[derive(Debug, Clone, Copy)]
pub struct FixedWindow {
    size: usize,
}

impl FixedWindow {
    /// Creates a window that always includes the `size` most recent values
    /// (or fewer when the prefix is shorter than `size`).
    pub fn new(size: usize) -> Self {
        FixedWindow { size: size.max(1) }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Applies `primitive` to the window ending at every index.
    pub fn apply<T, R, F>(&self, data: &[T], mut primitive: F) -> Vec<R>
    where
        F: FnMut(&[T]) -> R,
    {
        (0..data.len())
            .map(|index| {
                let start = (index + 1).saturating_sub(self.size);
                primitive(&data[start..=index])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::FixedWindow;

    #[test]
    fn fixed_window_applies_primitive_to_trailing_slices() {
        let window = FixedWindow::new(3);
        let data = vec![1.0, 2.0, 3.0, 4.0];
        let result = window.apply(&data, |slice| slice.iter().sum::<f64>());
        assert_eq!(result, vec![1.0, 3.0, 6.0, 9.0]);
    }

    #[test]
    fn zero_size_is_clamped_to_one() {
        let window = FixedWindow::new(0);
        assert_eq!(window.size(), 1);
        let result = window.apply(&[5, 6], |slice| slice.len());
        assert_eq!(result, vec![1, 1]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let window = FixedWindow::new(4);
        let result: Vec<usize> = window.apply(&[] as &[f64], |slice| slice.len());
        assert!(result.is_empty());
    }
}
