use chrono::{Datelike, NaiveDate};

/// Hand-maintained Thai public-holiday table, keyed by calendar year. The
/// labels are decorative annotations on the month view, not derived data;
/// extend the table when a new year is needed.
const HOLIDAYS_2024: &[(&str, &str)] = &[
    ("2024-01-01", "วันขึ้นปีใหม่"),
    ("2024-02-24", "วันมาฆบูชา"),
    ("2024-04-06", "วันจักรี"),
    ("2024-04-08", "ชดเชยวันจักรี"),
    ("2024-04-13", "วันสงกรานต์"),
    ("2024-04-14", "วันสงกรานต์"),
    ("2024-04-15", "วันสงกรานต์"),
    ("2024-05-01", "วันแรงงาน"),
    ("2024-05-04", "วันฉัตรมงคล"),
    ("2024-05-22", "วันวิสาขบูชา"),
    ("2024-06-03", "วันเฉลิมฯ พระราชินี"),
    ("2024-07-20", "วันอาสาฬหบูชา"),
    ("2024-07-28", "วันเฉลิมฯ ร.10"),
    ("2024-08-12", "วันแม่แห่งชาติ"),
    ("2024-10-13", "วันนวมินทรมหาราช"),
    ("2024-10-23", "วันปิยมหาราช"),
    ("2024-12-05", "วันพ่อแห่งชาติ"),
    ("2024-12-10", "วันรัฐธรรมนูญ"),
    ("2024-12-31", "วันสิ้นปี"),
];

const HOLIDAYS_2025: &[(&str, &str)] = &[
    ("2025-01-01", "วันขึ้นปีใหม่"),
    ("2025-02-12", "วันมาฆบูชา"),
    ("2025-04-06", "วันจักรี"),
    ("2025-04-07", "ชดเชยวันจักรี"),
    ("2025-04-13", "วันสงกรานต์"),
    ("2025-04-14", "วันสงกรานต์"),
    ("2025-04-15", "วันสงกรานต์"),
    ("2025-05-01", "วันแรงงาน"),
    ("2025-05-04", "วันฉัตรมงคล"),
    ("2025-05-05", "ชดเชยวันฉัตรมงคล"),
    ("2025-06-03", "วันเฉลิมฯ พระราชินี"),
    ("2025-06-10", "วันวิสาขบูชา"),
    ("2025-07-28", "วันเฉลิมฯ ร.10"),
    ("2025-07-29", "ชดเชยวันเฉลิมฯ ร.10"),
    ("2025-08-12", "วันแม่แห่งชาติ"),
    ("2025-10-13", "วันนวมินทรมหาราช"),
    ("2025-10-23", "วันปิยมหาราช"),
    ("2025-12-05", "วันพ่อแห่งชาติ"),
    ("2025-12-10", "วันรัฐธรรมนูญ"),
    ("2025-12-31", "วันสิ้นปี"),
];

pub fn holidays_in(year: i32) -> &'static [(&'static str, &'static str)] {
    match year {
        2024 => HOLIDAYS_2024,
        2025 => HOLIDAYS_2025,
        _ => &[],
    }
}

pub fn holiday_name(date: NaiveDate) -> Option<&'static str> {
    let key = date.format("%Y-%m-%d").to_string();
    holidays_in(date.year())
        .iter()
        .find(|(day, _)| *day == key)
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_holiday_resolves() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        assert_eq!(holiday_name(date), Some("วันวิสาขบูชา"));
    }

    #[test]
    fn ordinary_day_has_no_label() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();
        assert_eq!(holiday_name(date), None);
    }

    #[test]
    fn unlisted_year_is_empty() {
        assert!(holidays_in(1999).is_empty());
        let date = NaiveDate::from_ymd_opt(1999, 1, 1).unwrap();
        assert_eq!(holiday_name(date), None);
    }
}
