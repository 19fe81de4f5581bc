/// Rounds `$value` up to the next multiple of `$align`.
///
/// `$align` must be a power of two.
///
/// # Examples
///
/// ```rust
/// use regionpool::align_to;
///
/// assert_eq!(align_to!(13, 16), 16);
/// assert_eq!(align_to!(32, 16), 32);
/// assert_eq!(align_to!(0, 8), 0);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}
