use chrono::prelude::*;
use easy_ext::ext;

pub(crate) mod prelude {
    pub(crate) use super::NaiveDateExt as _;
}

#[ext(NaiveDateExt)]
pub(crate) impl NaiveDate {
    /// Short label used in chat messages and buttons, e.g. `05-Mar`
    fn short_label(&self) -> String {
        self.format("%d-%b").to_string()
    }

    /// Three-letter weekday name, e.g. `Wed`
    fn weekday_label(&self) -> String {
        self.format("%a").to_string()
    }

    /// Every day from `self` on, including `self`
    fn days_from(self, count: u64) -> Vec<NaiveDate> {
        self.iter_days().take(count as usize).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(date.short_label(), "05-Mar");
        assert_eq!(date.weekday_label(), "Tue");

        let days = date.days_from(3);
        assert_eq!(
            days,
            [
                date,
                NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
            ]
        );
    }
}
