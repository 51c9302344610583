use std::fmt::{Display, Formatter};
use std::time::Duration;

/// A single `Server-Timing` metric, duration in whole milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Timing {
    pub name: String,
    pub duration: String,
    pub description: Option<String>,
}

impl Display for Timing {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.description {
            Some(desc) => write!(f, "{};desc=\"{}\";dur={}", self.name, desc, self.duration),
            None => write!(f, "{};dur={}", self.name, self.duration),
        }
    }
}

impl Timing {
    pub fn new(name: &str, duration: Duration, description: Option<String>) -> Timing {
        Timing {
            name: name.to_string(),
            duration: duration.as_millis().to_string(),
            description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_display_description() {
        let timing = Timing::new(
            "fetch",
            Duration::from_millis(65),
            Some(String::from("s3 get")),
        );
        assert_eq!(format!("{timing}"), "fetch;desc=\"s3 get\";dur=65")
    }

    #[test]
    fn timing_display_no_description() {
        let timing = Timing::new("res", Duration::from_micros(1500), None);
        assert_eq!(format!("{timing}"), "res;dur=1")
    }
}
