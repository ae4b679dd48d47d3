//! Small extractors for the portal's auxiliary pages.

use crate::dom::{Page, Query};
use crate::error::Result;
use crate::models::{Session, Subject};
use crate::portal::{Endpoint, PageFetcher};

pub fn extract_school_name(html: &str) -> Option<String> {
    let page = Page::parse(html);
    let name = page
        .find_first(&Query::tag("span").with_class("scuola"))?
        .text()
        .trim()
        .to_string();
    (!name.is_empty()).then_some(name)
}

/// The school banner is only rendered for a logged-in session.
pub fn is_authenticated_page(html: &str) -> bool {
    Page::parse(html)
        .find_first(&Query::tag("span").with_class("scuola"))
        .is_some()
}

pub fn extract_grade_notes(html: &str) -> String {
    Page::parse(html)
        .find_first(&Query::tag("td").with_attr("colspan", "5"))
        .map(|cell| cell.text().trim().to_string())
        .unwrap_or_default()
}

/// Looks a subject up in the class lesson directory by (partial) title.
pub fn find_subject(html: &str, name: &str) -> Option<Subject> {
    let page = Page::parse(html);
    let entry = page
        .find_all(&Query::tag("div"))
        .find(|div| div.attr("title").is_some_and(|title| title.contains(name)))?;

    let id = entry.attr("materia_id")?;
    entry.attr("autori_id")?;
    let subject_name = entry.text();
    if subject_name.is_empty() {
        return None;
    }

    Some(Subject {
        id: id.trim().parse().unwrap_or(0),
        name: subject_name,
        teachers: Vec::new(),
    })
}

/// Teacher's notes for one grade, fetched from its detail page.
pub async fn fetch_grade_notes<F: PageFetcher + ?Sized>(
    fetcher: &F,
    session: &Session,
    event_id: i64,
) -> Result<String> {
    let html = fetcher.fetch(session, Endpoint::GradeDetail(event_id)).await?;
    Ok(extract_grade_notes(&html))
}

pub async fn fetch_subject<F: PageFetcher + ?Sized>(
    fetcher: &F,
    session: &Session,
    name: &str,
) -> Result<Option<Subject>> {
    let html = fetcher.fetch(session, Endpoint::SubjectDirectory).await?;
    Ok(find_subject(&html, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct SavedPages {
        requested: Mutex<Vec<Endpoint>>,
    }

    #[async_trait]
    impl PageFetcher for SavedPages {
        async fn fetch(&self, _session: &Session, endpoint: Endpoint) -> Result<String> {
            self.requested.lock().unwrap().push(endpoint);
            let body = match endpoint {
                Endpoint::GradeDetail(_) => r#"<table><tr><td colspan="5">Interrogazione</td></tr></table>"#,
                Endpoint::SubjectDirectory => {
                    r#"<div title="FISICA" materia_id="41" autori_id="3">FISICA</div>"#
                }
                _ => "",
            };
            Ok(body.to_string())
        }
    }

    fn session() -> Session {
        Session {
            session_id: "sess".to_string(),
            user_id: "S1234567X".to_string(),
        }
    }

    const MENU: &str = r#"
        <div class="header"><span class="nome">ROSSI MARIO</span>
        <span class="scuola"> I.I.S. GALILEI </span></div>
    "#;

    #[test]
    fn school_name_marks_authenticated_pages() {
        assert_eq!(extract_school_name(MENU).as_deref(), Some("I.I.S. GALILEI"));
        assert!(is_authenticated_page(MENU));

        let login = "<form><input name='uid'></form>";
        assert_eq!(extract_school_name(login), None);
        assert!(!is_authenticated_page(login));
    }

    #[test]
    fn grade_notes_come_from_wide_cell() {
        let html = r#"<table><tr><td colspan="2">x</td></tr>
            <tr><td colspan="5">  Verifica sui logaritmi  </td></tr></table>"#;
        assert_eq!(extract_grade_notes(html), "Verifica sui logaritmi");
        assert_eq!(extract_grade_notes("<p></p>"), "");
    }

    #[test]
    fn subject_lookup_needs_both_ids() {
        let html = r#"
            <div title="STORIA DELL'ARTE" materia_id="88">STORIA DELL'ARTE</div>
            <div title="MATEMATICA E COMPLEMENTI" materia_id="37" autori_id="12">MATEMATICA</div>
        "#;

        assert_eq!(
            find_subject(html, "MATEMATICA"),
            Some(Subject {
                id: 37,
                name: "MATEMATICA".to_string(),
                teachers: Vec::new(),
            })
        );
        assert_eq!(find_subject(html, "STORIA"), None);
        assert_eq!(find_subject(html, "FISICA"), None);
    }

    #[tokio::test]
    async fn auxiliary_pages_are_fetched_and_parsed() {
        let pages = SavedPages {
            requested: Mutex::new(Vec::new()),
        };

        let notes = fetch_grade_notes(&pages, &session(), 9001).await.unwrap();
        assert_eq!(notes, "Interrogazione");

        let subject = fetch_subject(&pages, &session(), "FISICA").await.unwrap();
        assert_eq!(subject.map(|s| s.id), Some(41));

        assert_eq!(
            *pages.requested.lock().unwrap(),
            vec![Endpoint::GradeDetail(9001), Endpoint::SubjectDirectory]
        );
    }
}
