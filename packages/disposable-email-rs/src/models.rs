use serde::Deserialize;

/// Body returned by the checker. Fields other than `disposable` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckerResponse {
    pub disposable: Option<String>,
    pub email: Option<String>,
}

impl CheckerResponse {
    pub fn verdict(&self) -> Option<Verdict> {
        self.disposable.as_deref().map(|flag| {
            if flag.trim().eq_ignore_ascii_case("yes") {
                Verdict::Disposable
            } else {
                Verdict::Deliverable
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Disposable,
    Deliverable,
}
