macro_rules! invalid_format {
    ($($args:tt)+) => {
        return Err($crate::Error::InvalidFormat(format!($($args)+)))
    };
}

macro_rules! corrupt_data {
    ($($args:tt)+) => {
        return Err($crate::Error::CorruptData(format!($($args)+)))
    };
}
