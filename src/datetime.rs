use std::convert::TryInto;

use time::PrimitiveDateTime;

/// Decodes the DOS-style date and time words stored in a file record.
/// Returns `None` for bit patterns that do not name a valid date/time.
pub(crate) fn datetime_from_bits(
    date: u16,
    time: u16,
) -> Option<PrimitiveDateTime> {
    let year = (date >> 9) as i32 + 1980;
    let month = (((date >> 5) & 0xf) as u8).try_into().ok()?;
    let day = (date & 0x1f) as u8;
    let date = time::Date::from_calendar_date(year, month, day).ok()?;

    let hour = (time >> 11) as u8;
    let minute = ((time >> 5) & 0x3f) as u8;
    let second = 2 * (time & 0x1f) as u8;
    let time = time::Time::from_hms(hour, minute, second).ok()?;

    Some(PrimitiveDateTime::new(date, time))
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::datetime_from_bits;

    #[test]
    fn valid_datetime_bits() {
        assert_eq!(
            datetime_from_bits(0x4c26, 0x7a75),
            Some(datetime!(2018-01-06 15:19:42))
        );
    }

    #[test]
    fn invalid_datetime_bits() {
        // Month zero is not a date.
        assert_eq!(datetime_from_bits(0x0001, 0x0000), None);
        // Hour 31 is not a time.
        assert_eq!(datetime_from_bits(0x4c26, 0xf800), None);
    }
}
