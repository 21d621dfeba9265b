use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::classify::{domain_from_url, Category, Classifier};

/// Time spent on a domain, produced every time an open interval is closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub domain: Arc<str>,
    pub seconds: u64,
    pub category: Category,
}

/// What happened in the browser, reduced to its effect on the open interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<'a> {
    /// Another tab became the active one. `None` means the tab had no url.
    Switch(Option<&'a str>),
    /// The browser lost focus.
    Stop,
    /// Persist progress of the open interval and keep tracking the same domain.
    Flush,
}

/// The tracking state. It's a plain value: every transition consumes the session and returns
/// the next one, together with the visit that got closed along the way.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Idle,
    Tracking {
        domain: Arc<str>,
        category: Category,
        since: DateTime<Utc>,
    },
}

impl Session {
    pub fn domain(&self) -> Option<&str> {
        match self {
            Session::Idle => None,
            Session::Tracking { domain, .. } => Some(domain),
        }
    }

    pub fn advance(
        self,
        transition: Transition<'_>,
        now: DateTime<Utc>,
        classifier: &Classifier,
    ) -> (Session, Option<Visit>) {
        let (restarted, visit) = self.close(now);
        let next = match transition {
            Transition::Flush => restarted,
            Transition::Stop => Session::Idle,
            Transition::Switch(url) => Self::open(url, now, classifier),
        };
        (next, visit)
    }

    /// Closes the open interval at `now`. The returned session tracks the same domain from
    /// `now` on.
    fn close(self, now: DateTime<Utc>) -> (Session, Option<Visit>) {
        let Session::Tracking {
            domain,
            category,
            since,
        } = self
        else {
            return (Session::Idle, None);
        };

        let seconds = rounded_seconds(now - since);
        let visit = (seconds > 0).then(|| Visit {
            domain: domain.clone(),
            seconds: seconds as u64,
            category,
        });

        (
            Session::Tracking {
                domain,
                category,
                since: now,
            },
            visit,
        )
    }

    fn open(url: Option<&str>, now: DateTime<Utc>, classifier: &Classifier) -> Session {
        let Some(url) = url else {
            debug!("Active tab has no url, nothing to track");
            return Session::Idle;
        };
        match domain_from_url(url) {
            Ok(domain) => {
                let category = classifier.classify(&domain);
                debug!("Now tracking {domain} ({category})");
                Session::Tracking {
                    domain: domain.into(),
                    category,
                    since: now,
                }
            }
            Err(e) => {
                warn!("Couldn't extract a domain from {url:?}: {e}");
                Session::Idle
            }
        }
    }
}

/// Whole seconds, half rounded up.
fn rounded_seconds(elapsed: chrono::Duration) -> i64 {
    (elapsed.num_milliseconds() + 500).div_euclid(1000)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

    use crate::classify::{Category, Classifier};

    use super::{Session, Transition, Visit};

    fn start() -> DateTime<Utc> {
        Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(2018, 7, 4)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        )
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        start() + Duration::seconds(seconds)
    }

    fn visit(domain: &str, seconds: u64, category: Category) -> Option<Visit> {
        Some(Visit {
            domain: domain.into(),
            seconds,
            category,
        })
    }

    #[test]
    fn test_switching_closes_previous_domain() {
        let classifier = Classifier::default();
        let session = Session::Idle;

        let (session, closed) = session.advance(
            Transition::Switch(Some("https://github.com/rust-lang")),
            at(0),
            &classifier,
        );
        assert_eq!(closed, None);
        assert_eq!(session.domain(), Some("github.com"));

        let (session, closed) = session.advance(
            Transition::Switch(Some("https://www.facebook.com/")),
            at(120),
            &classifier,
        );
        assert_eq!(closed, visit("github.com", 120, Category::Productive));
        assert_eq!(session.domain(), Some("facebook.com"));

        let (session, closed) = session.advance(Transition::Stop, at(420), &classifier);
        assert_eq!(closed, visit("facebook.com", 300, Category::Unproductive));
        assert_eq!(session, Session::Idle);
    }

    #[test]
    fn test_flush_keeps_domain() {
        let classifier = Classifier::default();
        let (session, _) = Session::Idle.advance(
            Transition::Switch(Some("https://example.org")),
            at(0),
            &classifier,
        );

        let (session, closed) = session.advance(Transition::Flush, at(60), &classifier);
        assert_eq!(closed, visit("example.org", 60, Category::Neutral));
        assert_eq!(
            session,
            Session::Tracking {
                domain: "example.org".into(),
                category: Category::Neutral,
                since: at(60)
            }
        );

        // Nothing elapsed since the previous flush.
        let (session, closed) = session.advance(Transition::Flush, at(60), &classifier);
        assert_eq!(closed, None);
        assert_eq!(session.domain(), Some("example.org"));
    }

    #[test]
    fn test_idle_transitions_emit_nothing() {
        let classifier = Classifier::default();
        let (session, closed) = Session::Idle.advance(Transition::Flush, at(10), &classifier);
        assert_eq!((session.clone(), closed), (Session::Idle, None));
        let (session, closed) = session.advance(Transition::Stop, at(20), &classifier);
        assert_eq!((session, closed), (Session::Idle, None));
    }

    #[test]
    fn test_bad_url_closes_and_goes_idle() {
        let classifier = Classifier::default();
        let (session, _) = Session::Idle.advance(
            Transition::Switch(Some("https://reddit.com/r/rust")),
            at(0),
            &classifier,
        );

        let (session, closed) =
            session.advance(Transition::Switch(Some("::not a url::")), at(30), &classifier);
        assert_eq!(closed, visit("reddit.com", 30, Category::Unproductive));
        assert_eq!(session, Session::Idle);

        let (_, closed) = session.advance(Transition::Flush, at(90), &classifier);
        assert_eq!(closed, None);
    }

    #[test]
    fn test_missing_url_goes_idle() {
        let classifier = Classifier::default();
        let (session, _) = Session::Idle.advance(
            Transition::Switch(Some("https://reddit.com")),
            at(0),
            &classifier,
        );
        let (session, closed) = session.advance(Transition::Switch(None), at(5), &classifier);
        assert_eq!(closed, visit("reddit.com", 5, Category::Unproductive));
        assert_eq!(session, Session::Idle);
    }

    #[test]
    fn test_rounding_and_clock_going_backwards() {
        let classifier = Classifier::default();
        let (session, _) = Session::Idle.advance(
            Transition::Switch(Some("https://github.com")),
            at(0),
            &classifier,
        );

        let (session, closed) = session.advance(
            Transition::Flush,
            at(0) + Duration::milliseconds(499),
            &classifier,
        );
        assert_eq!(closed, None);

        let (session, closed) = session.advance(
            Transition::Flush,
            at(0) + Duration::milliseconds(499 + 1500),
            &classifier,
        );
        assert_eq!(closed, visit("github.com", 2, Category::Productive));

        let (_, closed) = session.advance(Transition::Flush, at(-100), &classifier);
        assert_eq!(closed, None);
    }
}
