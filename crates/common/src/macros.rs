#[macro_export]
macro_rules! horner {
    ($c: expr) => ( $c );
    ($var: expr, $c: expr ) => ( $c );
    ($var: expr, $c: expr, $($cs:expr),+) => {
        $c + $var * horner!($var, $($cs),+)
    };
}

pub use horner;
