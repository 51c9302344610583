use crate::domain::server_timing::timing::Timing;
use std::fmt::{Display, Formatter};

pub mod timing;

/// Value of a `Server-Timing` header: one metric per pipeline phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerTiming {
    timings: Vec<Timing>,
}

impl Display for ServerTiming {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = self
            .timings
            .iter()
            .map(|tim| tim.to_string())
            .collect::<Vec<String>>()
            .join(", ");

        write!(f, "{display}")
    }
}

impl ServerTiming {
    pub fn new(timings: Vec<Timing>) -> ServerTiming {
        ServerTiming { timings }
    }

    pub fn push(&mut self, timing: Timing) {
        self.timings.push(timing);
    }

    pub fn prepend(&mut self, timing: Timing) {
        self.timings.insert(0, timing);
    }

    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }
}
