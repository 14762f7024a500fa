/// File naming conventions shared by `init`, discovery and the reporter.
/// Keeping them in one place means a downloaded sample set is always
/// recognised by the test engine.

use chrono::{DateTime, Local};

pub const ANSWER_EXTENSION: &str = "ans";
pub const INPUT_EXTENSION: &str = "in";
pub const DIAGNOSTIC_SUFFIX: &str = ".testresult.md";

/// Problem ids with this prefix live on the ITU instance
pub const ITU_PREFIX: &str = "itu.";

pub const OPEN_KATTIS_URL: &str = "https://open.kattis.com";
pub const ITU_KATTIS_URL: &str = "https://itu.kattis.com";

const SAMPLES_PATH: &str = "file/statement/samples.zip";
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S%.6f";

/// Input file name paired with an answer file stem
pub fn input_file_name(stem: &str) -> String {
    format!("{}.{}", stem, INPUT_EXTENSION)
}

/// Whether a file extension marks an expected answer (ASCII case-insensitive)
pub fn is_answer_extension(ext: &str) -> bool {
    ext.eq_ignore_ascii_case(ANSWER_EXTENSION)
}

/// Samples archive URL below a Kattis base URL
pub fn samples_url(base_url: &str, problem_id: &str) -> String {
    format!(
        "{}/problems/{}/{}",
        base_url.trim_end_matches('/'),
        problem_id,
        SAMPLES_PATH
    )
}

/// Timestamp as embedded in diagnostic file names
pub fn artifact_timestamp(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// `<input-filename>-<timestamp>.testresult.md`, with `-<n>` before the
/// suffix when an earlier artifact already took the plain name
pub fn diagnostic_file_name(input_name: &str, at: &DateTime<Local>, attempt: u32) -> String {
    let stamp = artifact_timestamp(at);
    if attempt == 0 {
        format!("{}-{}{}", input_name, stamp, DIAGNOSTIC_SUFFIX)
    } else {
        format!("{}-{}-{}{}", input_name, stamp, attempt, DIAGNOSTIC_SUFFIX)
    }
}
