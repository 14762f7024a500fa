// Endpoint configuration for sample downloads

use crate::naming::{self, ITU_PREFIX};

/// Base URLs of the two Kattis instances samples are fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KattisEndpoints {
    pub open_url: String,
    pub itu_url: String,
}

impl Default for KattisEndpoints {
    fn default() -> Self {
        Self {
            open_url: naming::OPEN_KATTIS_URL.to_string(),
            itu_url: naming::ITU_KATTIS_URL.to_string(),
        }
    }
}

impl KattisEndpoints {
    /// Defaults, overridden by `KATTIS_OPEN_URL` / `KATTIS_ITU_URL`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            open_url: std::env::var("KATTIS_OPEN_URL").unwrap_or(defaults.open_url),
            itu_url: std::env::var("KATTIS_ITU_URL").unwrap_or(defaults.itu_url),
        }
    }

    /// Samples archive URL for a problem, picking the instance by id prefix
    pub fn samples_url(&self, problem_id: &str) -> String {
        let base = if problem_id.starts_with(ITU_PREFIX) {
            &self.itu_url
        } else {
            &self.open_url
        };
        naming::samples_url(base, problem_id)
    }
}
