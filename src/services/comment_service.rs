use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::dav::bodies;
use crate::dav::transport::{send_checked, DavMethod, DavRequest, Depth};
use crate::error::AppError;
use crate::models::pagination::PaginationCursor;
use crate::models::resource::ResourceRecord;
use crate::services::lister::{comments_path, Collection, ResourceLister};
use crate::services::tag_service::parse_id_from_location;
use crate::validation::validate_message;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub display_name: String,
}

/// Comments on one resource, fetched a page at a time.
pub struct CommentsFeed {
    lister: Arc<ResourceLister>,
    collection: Collection,
    cursor: PaginationCursor,
    comments: Vec<ResourceRecord>,
    done: bool,
}

impl CommentsFeed {
    pub fn new(lister: Arc<ResourceLister>, resource_type: &str, resource_id: &str) -> Self {
        Self {
            cursor: lister.first_page(),
            lister,
            collection: Collection::comments(resource_type, resource_id),
            comments: Vec::new(),
            done: false,
        }
    }

    pub fn comments(&self) -> &[ResourceRecord] {
        &self.comments
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Fetches the next page and returns the newly appended comments. Once a
    /// short page has been seen, no further requests are made.
    pub async fn next_page(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<&[ResourceRecord], AppError> {
        if self.done {
            return Ok(&[]);
        }
        let page = self
            .lister
            .list_resources(&self.collection, self.cursor, cancel)
            .await?;
        if page.len() < self.cursor.limit.get() as usize {
            self.done = true;
        }
        self.cursor = self.cursor.next();
        let start = self.comments.len();
        self.comments.extend(page);
        Ok(&self.comments[start..])
    }
}

pub struct CommentService {
    lister: Arc<ResourceLister>,
}

impl CommentService {
    pub fn new(lister: Arc<ResourceLister>) -> Self {
        Self { lister }
    }

    pub fn feed(&self, resource_type: &str, resource_id: &str) -> CommentsFeed {
        CommentsFeed::new(self.lister.clone(), resource_type, resource_id)
    }

    pub async fn post_comment(
        &self,
        resource_type: &str,
        resource_id: &str,
        actor: &Actor,
        message: &str,
    ) -> Result<ResourceRecord, AppError> {
        validate_message(message)?;
        let collection = comments_path(resource_type, resource_id);
        let payload = serde_json::json!({
            "actorDisplayName": actor.display_name,
            "actorId": actor.id,
            "actorType": "users",
            "creationDateTime": bodies::http_date(Utc::now()),
            "message": message,
            "objectType": resource_type,
            "verb": "comment",
        });
        let response = send_checked(
            self.lister.transport(),
            DavRequest::new(DavMethod::Post, collection.clone()).json(payload),
        )
        .await?;

        let location = response
            .header("Content-Location")
            .ok_or(AppError::MissingHeader("Content-Location"))?;
        let id = parse_id_from_location(location)
            .ok_or_else(|| AppError::Parse(format!("no comment id in location {location}")))?;
        tracing::info!(resource_type, resource_id, id, "posted comment");

        let request = DavRequest::new(DavMethod::Propfind, format!("{collection}/{id}"))
            .depth(Depth::Zero)
            .xml(bodies::comment_propfind());
        self.lister
            .query(request, "/", &CancellationToken::new())
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Parse(format!("no entry returned for comment {id}")))
    }

    pub async fn edit_comment(
        &self,
        resource_type: &str,
        resource_id: &str,
        comment_id: &str,
        message: &str,
    ) -> Result<(), AppError> {
        validate_message(message)?;
        let path = format!("{}/{comment_id}", comments_path(resource_type, resource_id));
        send_checked(
            self.lister.transport(),
            DavRequest::new(DavMethod::Proppatch, path).xml(bodies::comment_message(message)),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_comment(
        &self,
        resource_type: &str,
        resource_id: &str,
        comment_id: &str,
    ) -> Result<(), AppError> {
        let path = format!("{}/{comment_id}", comments_path(resource_type, resource_id));
        send_checked(self.lister.transport(), DavRequest::new(DavMethod::Delete, path)).await?;
        Ok(())
    }

    pub async fn mark_comments_as_read(
        &self,
        resource_type: &str,
        resource_id: &str,
        date: DateTime<Utc>,
    ) -> Result<(), AppError> {
        send_checked(
            self.lister.transport(),
            DavRequest::new(DavMethod::Proppatch, comments_path(resource_type, resource_id))
                .xml(bodies::read_marker(date)),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::dav::fake::FakeTransport;
    use crate::dav::transport::RequestBody;
    use crate::services::lister::tests::{config, lister, multistatus};
    use chrono::TimeZone;

    fn comment(id: u32) -> String {
        format!(
            "<d:response><d:href>/remote.php/dav/comments/files/12/{id}</d:href><d:propstat><d:prop><oc:id>{id}</oc:id><oc:message>m{id}</oc:message></d:prop><d:status>HTTP/1.1 200 OK</d:status></d:propstat></d:response>"
        )
    }

    fn page(ids: std::ops::Range<u32>) -> String {
        multistatus(&ids.map(comment).collect::<Vec<_>>())
    }

    fn xml_body(request: &DavRequest) -> &str {
        match &request.body {
            Some(RequestBody::Xml(xml)) => xml,
            other => panic!("expected xml body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn feed_pages_until_short_page() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(DavMethod::Report, "/comments/files/12", 207, &page(0..20));
        fake.respond(DavMethod::Report, "/comments/files/12", 207, &page(20..25));
        let service = CommentService::new(Arc::new(lister(&fake)));
        let token = CancellationToken::new();

        let mut feed = service.feed("files", "12");
        assert_eq!(feed.next_page(&token).await.unwrap().len(), 20);
        assert!(!feed.is_done());
        assert_eq!(feed.next_page(&token).await.unwrap().len(), 5);
        assert!(feed.is_done());
        assert!(feed.next_page(&token).await.unwrap().is_empty());
        assert_eq!(feed.comments().len(), 25);

        let sent = fake.requests();
        assert_eq!(sent.len(), 2);
        assert!(xml_body(&sent[1]).contains("<oc:offset>20</oc:offset>"));
    }

    #[tokio::test]
    async fn feed_uses_configured_page_limit() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(DavMethod::Report, "/comments/files/12", 207, &page(0..5));
        fake.respond(DavMethod::Report, "/comments/files/12", 207, &page(5..7));
        let config = ClientConfig {
            page_limit: 5,
            ..config()
        };
        let service = CommentService::new(Arc::new(ResourceLister::new(fake.clone(), &config)));
        let token = CancellationToken::new();

        let mut feed = service.feed("files", "12");
        assert_eq!(feed.next_page(&token).await.unwrap().len(), 5);
        assert!(!feed.is_done());
        assert_eq!(feed.next_page(&token).await.unwrap().len(), 2);
        assert!(feed.is_done());

        let sent = fake.requests();
        assert!(xml_body(&sent[0]).contains("<oc:limit>5</oc:limit><oc:offset>0</oc:offset>"));
        assert!(xml_body(&sent[1]).contains("<oc:limit>5</oc:limit><oc:offset>5</oc:offset>"));
    }

    #[tokio::test]
    async fn cancelled_page_leaves_feed_unchanged() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(DavMethod::Report, "/comments/files/12", 207, &page(0..3));
        let service = CommentService::new(Arc::new(lister(&fake)));
        let token = CancellationToken::new();
        token.cancel();

        let mut feed = service.feed("files", "12");
        let err = feed.next_page(&token).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(!feed.is_done());
        assert!(feed.comments().is_empty());
    }

    #[tokio::test]
    async fn post_comment_stats_the_new_comment() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond_with_headers(
            DavMethod::Post,
            "/comments/files/12",
            201,
            "",
            &[("Content-Location", "/remote.php/dav/comments/files/12/7")],
        );
        fake.respond(DavMethod::Propfind, "/comments/files/12/7", 207, &multistatus(&[comment(7)]));
        let service = CommentService::new(Arc::new(lister(&fake)));
        let actor = Actor {
            id: "alice".to_string(),
            display_name: "Alice".to_string(),
        };

        let posted = service
            .post_comment("files", "12", &actor, "m7")
            .await
            .unwrap();
        assert_eq!(posted.id, "7");
        assert_eq!(posted.extra_str("message"), Some("m7"));

        match &fake.requests()[0].body {
            Some(RequestBody::Json(json)) => {
                assert_eq!(json["actorId"], "alice");
                assert_eq!(json["actorType"], "users");
                assert_eq!(json["verb"], "comment");
                assert_eq!(json["objectType"], "files");
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_message_is_rejected_locally() {
        let fake = Arc::new(FakeTransport::new());
        let service = CommentService::new(Arc::new(lister(&fake)));
        let actor = Actor {
            id: "a".to_string(),
            display_name: "A".to_string(),
        };
        assert!(service.post_comment("files", "1", &actor, "  ").await.is_err());
        assert!(service.edit_comment("files", "1", "2", "").await.is_err());
        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn mark_read_sends_utc_read_marker() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(DavMethod::Proppatch, "/comments/files/12", 207, "");
        fake.respond(DavMethod::Delete, "/comments/files/12/3", 204, "");
        let service = CommentService::new(Arc::new(lister(&fake)));
        let date = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        service.mark_comments_as_read("files", "12", date).await.unwrap();
        service.delete_comment("files", "12", "3").await.unwrap();

        let sent = fake.requests();
        assert!(xml_body(&sent[0])
            .contains("<oc:readMarker>Sat, 01 Jun 2024 12:00:00 GMT</oc:readMarker>"));
        assert_eq!(sent[1].method, DavMethod::Delete);
    }
}
