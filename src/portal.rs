use async_trait::async_trait;
use reqwest::header::COOKIE;
use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::models::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Grades,
    Attendance,
    /// Landing menu; doubles as the session probe.
    Menu,
    GradeDetail(i64),
    SubjectDirectory,
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::Grades => "/cvv/app/default/genitori_voti.php".to_string(),
            Endpoint::Attendance => "/tic/app/default/consultasingolo.php".to_string(),
            Endpoint::Menu => "/home/app/default/menu_webinfoschool_genitori.php".to_string(),
            Endpoint::GradeDetail(event_id) => format!(
                "/cvv/app/default/genitori_voti.php?ope=voto_detail&evento_id={event_id}"
            ),
            Endpoint::SubjectDirectory => {
                "/fml/app/default/regclasse_lezioni_xstudenti.php".to_string()
            }
        }
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Full decoded body of `endpoint`. Transport failures, timeouts and
    /// non-success statuses are errors; no partial body is ever returned.
    async fn fetch(&self, session: &Session, endpoint: Endpoint) -> Result<String>;
}

pub struct PortalClient {
    http: reqwest::Client,
    base_url: String,
}

impl PortalClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("portal-grades/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }
}

pub fn session_cookie(session: &Session) -> String {
    format!(
        "PHPSESSID={}; webidentity={};",
        session.session_id, session.user_id
    )
}

#[async_trait]
impl PageFetcher for PortalClient {
    async fn fetch(&self, session: &Session, endpoint: Endpoint) -> Result<String> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        debug!(%url, "fetching portal page");

        let body = self
            .http
            .get(&url)
            .header(COOKIE, session_cookie(session))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_match_portal_layout() {
        assert_eq!(Endpoint::Grades.path(), "/cvv/app/default/genitori_voti.php");
        assert_eq!(
            Endpoint::GradeDetail(42).path(),
            "/cvv/app/default/genitori_voti.php?ope=voto_detail&evento_id=42"
        );
    }

    #[test]
    fn cookie_carries_session_and_identity() {
        let session = Session {
            session_id: "abc123".to_string(),
            user_id: "S1234567X".to_string(),
        };
        assert_eq!(session_cookie(&session), "PHPSESSID=abc123; webidentity=S1234567X;");
    }

    #[test]
    fn client_builds_from_config() {
        assert!(PortalClient::new(&Config::default()).is_ok());
    }
}
