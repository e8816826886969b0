use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::base::query::{ArticleQuery, QueryEcho};
use crate::base::repository::{ArticleRepository, ColumnRepository, CommentReader, TagRepository};
use crate::config::BlogConfig;
use crate::data::database::Database;
use crate::models::article::{Article, ArticleId};
use crate::models::column::{Column, ColumnId};
use crate::models::comment::Comment;
use crate::models::tag::TagId;
use crate::services::markdown::{MarkdownRenderer, RenderedBody};
use crate::utils;
use crate::web::error::HandlerError;
use crate::web::pagination::{Page, Paginator};
use crate::web::params::{ArticleForm, Attachment, Identity, ListParams, Method};

/// Named targets a handler can redirect to; the HTTP layer resolves
/// them to concrete paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ArticleList,
    ArticleDetail(ArticleId),
    Login,
}

/// What a form-bearing handler produced: either a page to render or a
/// redirect to follow.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<P> {
    Page(P),
    Redirect(Route),
}

/// Context for the listing template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPage {
    pub articles: Page<Article>,
    /// Normalized search/filter state for UI round-tripping
    pub echo: QueryEcho,
}

/// Context for the detail template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailPage {
    pub article: Article,
    /// Body rendered from Markdown, with table of contents
    pub body: RenderedBody,
    pub comments: Vec<Comment>,
    /// Article with the greatest id below this one, if any
    pub previous: Option<Article>,
    /// Article with the smallest id above this one, if any
    pub next: Option<Article>,
}

/// Context for the create form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateFormPage {
    pub columns: Vec<Column>,
}

/// Context for the update form, pre-filled with current values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateFormPage {
    pub article: Article,
    pub columns: Vec<Column>,
}

/// The handler set over the article store. One logical store
/// transaction per call; no state is shared between calls beyond the
/// connection pool.
pub struct Blog {
    articles: Arc<dyn ArticleRepository>,
    columns: Arc<dyn ColumnRepository>,
    tags: Arc<dyn TagRepository>,
    comments: Arc<dyn CommentReader>,
    renderer: MarkdownRenderer,
    config: BlogConfig,
}

impl Blog {
    pub fn new(database: &Database, config: BlogConfig) -> Self {
        Self {
            articles: database.article_repository(),
            columns: database.column_repository(),
            tags: database.tag_repository(),
            comments: database.comment_reader(),
            renderer: MarkdownRenderer::new(),
            config,
        }
    }

    /// Listing route: normalize the raw parameters into a query, run
    /// it, slice the result into the requested page.
    pub fn article_list(&self, params: &ListParams) -> Result<ListPage, HandlerError> {
        let (query, echo) = ArticleQuery::from_params(params);
        debug!("Listing articles with {:?}", query);

        let articles = self.articles.list_articles(&query)?;
        let page =
            Paginator::new(articles, self.config.page_size).get_page(params.page.as_deref());

        Ok(ListPage {
            articles: page,
            echo,
        })
    }

    /// Detail route: counts the view first (atomically, so concurrent
    /// readers never lose an increment), then renders the body and
    /// gathers comments and neighbors.
    pub fn article_detail(&self, id: ArticleId) -> Result<DetailPage, HandlerError> {
        if !self.articles.increase_views(id)? {
            return Err(HandlerError::NotFound(id));
        }
        let article = self
            .articles
            .get_article(id)?
            .ok_or(HandlerError::NotFound(id))?;

        let body = self.renderer.render(&article.body);
        let comments = self.comments.get_comments_for_article(id)?;
        let previous = self.articles.previous_article(id)?;
        let next = self.articles.next_article(id)?;

        Ok(DetailPage {
            article,
            body,
            comments,
            previous,
            next,
        })
    }

    /// Create route. GET shows the empty form; POST validates and
    /// persists, then redirects to the listing.
    pub fn article_create(
        &self,
        identity: Identity,
        method: Method,
        form: Option<&ArticleForm>,
    ) -> Result<Outcome<CreateFormPage>, HandlerError> {
        let Some(author) = identity.user_id() else {
            return Ok(Outcome::Redirect(Route::Login));
        };

        if method != Method::Post {
            return Ok(Outcome::Page(CreateFormPage {
                columns: self.columns.get_all_columns()?,
            }));
        }

        let form = form.ok_or_else(|| HandlerError::Validation("missing form data".into()))?;
        form.validate().map_err(HandlerError::Validation)?;
        let column = self.resolve_column(&form.column)?;

        let mut article = Article::new(author, form.title.clone(), form.body.clone());
        article.column = column;
        if let Some(attachment) = &form.attachment {
            article.cover = Some(self.store_attachment(attachment)?);
        }

        let id = self.articles.create_article(&article)?;
        self.apply_tags(id, &form.tags)?;
        info!("User {} created article {}", author, id);

        Ok(Outcome::Redirect(Route::ArticleList))
    }

    /// Update route. Only the author may update; GET returns the
    /// current values for editing, POST overwrites title, body, column
    /// and tags and redirects to the detail page.
    pub fn article_update(
        &self,
        identity: Identity,
        id: ArticleId,
        method: Method,
        form: Option<&ArticleForm>,
    ) -> Result<Outcome<UpdateFormPage>, HandlerError> {
        let Some(caller) = identity.user_id() else {
            return Ok(Outcome::Redirect(Route::Login));
        };

        let mut article = self
            .articles
            .get_article(id)?
            .ok_or(HandlerError::NotFound(id))?;
        if article.author != caller {
            return Err(HandlerError::Forbidden);
        }

        if method != Method::Post {
            return Ok(Outcome::Page(UpdateFormPage {
                article,
                columns: self.columns.get_all_columns()?,
            }));
        }

        let form = form.ok_or_else(|| HandlerError::Validation("missing form data".into()))?;
        form.validate().map_err(HandlerError::Validation)?;
        let column = self.resolve_column(&form.column)?;

        article.title = form.title.clone();
        article.body = form.body.clone();
        article.column = column;
        article.touch();

        self.articles.update_article(&article)?;
        self.apply_tags(id, &form.tags)?;
        info!("User {} updated article {}", caller, id);

        Ok(Outcome::Redirect(Route::ArticleDetail(id)))
    }

    /// Delete route: POST only, author only. Removes the article and
    /// its tag associations permanently.
    pub fn article_delete(
        &self,
        identity: Identity,
        id: ArticleId,
        method: Method,
    ) -> Result<Route, HandlerError> {
        if method != Method::Post {
            return Err(HandlerError::MethodNotAllowed);
        }
        let Some(caller) = identity.user_id() else {
            return Ok(Route::Login);
        };

        let article = self
            .articles
            .get_article(id)?
            .ok_or(HandlerError::NotFound(id))?;
        if article.author != caller {
            return Err(HandlerError::Forbidden);
        }

        self.articles.delete_article(id)?;
        info!("User {} deleted article {}", caller, id);

        Ok(Route::ArticleList)
    }

    /// Like route: POST only, open to everyone, no duplicate-click
    /// protection. The increment is a single atomic store update.
    pub fn article_like(&self, id: ArticleId, method: Method) -> Result<(), HandlerError> {
        if method != Method::Post {
            return Err(HandlerError::MethodNotAllowed);
        }
        if !self.articles.increase_likes(id)? {
            return Err(HandlerError::NotFound(id));
        }
        Ok(())
    }

    /// Resolves the form's column token: the sentinel (or an empty
    /// token) means no column, anything else must name an existing
    /// column.
    fn resolve_column(&self, token: &str) -> Result<Option<ColumnId>, HandlerError> {
        if token.is_empty() || token == ArticleForm::NO_COLUMN {
            return Ok(None);
        }
        let id = token
            .parse::<i64>()
            .map_err(|_| HandlerError::Validation(format!("invalid column token {:?}", token)))?;
        let column = self
            .columns
            .get_column(ColumnId(id))?
            .ok_or_else(|| HandlerError::Validation(format!("unknown column {}", id)))?;
        Ok(Some(column.id))
    }

    /// Commits the form's tag names as the article's tag set, creating
    /// missing tags on the fly.
    fn apply_tags(&self, id: ArticleId, names: &[String]) -> Result<(), HandlerError> {
        let mut tag_ids: Vec<TagId> = Vec::new();
        for name in names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            tag_ids.push(self.tags.get_or_create_tag(name)?.id);
        }
        self.tags.set_article_tags(id, &tag_ids)?;
        Ok(())
    }

    /// Writes an uploaded attachment under the media root and returns
    /// the stored path. Names are sanitized and prefixed with the
    /// upload time so files never overwrite each other.
    fn store_attachment(&self, attachment: &Attachment) -> Result<String, HandlerError> {
        let file_name = format!(
            "{}-{}",
            Utc::now().timestamp(),
            utils::sanitize_file_name(&attachment.file_name)
        );
        let path = self.config.media_root.join("covers").join(file_name);

        utils::ensure_directory_exists(&path)?;
        std::fs::write(&path, &attachment.content)
            .with_context(|| format!("Failed to store attachment at {}", path.display()))?;

        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::article::UserId;

    const U: Identity = Identity::User(UserId(1));
    const V: Identity = Identity::User(UserId(2));

    fn blog() -> (Database, Blog) {
        let database = Database::in_memory().unwrap();
        let config = BlogConfig {
            media_root: std::env::temp_dir().join("inkpost-test-media"),
            ..Default::default()
        };
        let blog = Blog::new(&database, config);
        (database, blog)
    }

    fn form(title: &str, body: &str) -> ArticleForm {
        ArticleForm {
            title: title.into(),
            body: body.into(),
            column: ArticleForm::NO_COLUMN.into(),
            ..Default::default()
        }
    }

    fn create(blog: &Blog, identity: Identity, form: &ArticleForm) -> ArticleId {
        let outcome = blog
            .article_create(identity, Method::Post, Some(form))
            .unwrap();
        assert_eq!(outcome, Outcome::Redirect(Route::ArticleList));
        // Newest-first listing puts the fresh article up front
        blog.article_list(&ListParams::default()).unwrap().articles.items[0].id
    }

    #[test]
    fn test_detail_counts_each_read() {
        let (_db, blog) = blog();
        let id = create(&blog, U, &form("Hello", "World"));

        let first = blog.article_detail(id).unwrap();
        assert_eq!(first.article.total_views, 1);

        let second = blog.article_detail(id).unwrap();
        assert_eq!(second.article.total_views, 2);
    }

    #[test]
    fn test_detail_renders_body_and_toc() {
        let (_db, blog) = blog();
        let id = create(&blog, U, &form("Doc", "# Intro\n\nsome *text*\n"));

        let page = blog.article_detail(id).unwrap();

        assert!(page.body.html.contains("<em>text</em>"));
        assert_eq!(page.body.toc[0].anchor, "intro");
        // The stored body stays Markdown
        assert!(page.article.body.starts_with("# Intro"));
    }

    #[test]
    fn test_detail_of_unknown_article_is_not_found() {
        let (_db, blog) = blog();
        let err = blog.article_detail(ArticleId(99)).unwrap_err();
        assert!(matches!(err, HandlerError::NotFound(_)));
    }

    #[test]
    fn test_detail_includes_neighbors_and_comments() {
        let (db, blog) = blog();
        let a = create(&blog, U, &form("a", "x"));
        let b = create(&blog, U, &form("b", "x"));
        let c = create(&blog, U, &form("c", "x"));

        let conn = db.pool().get().unwrap();
        conn.execute(
            "INSERT INTO comments (article_id, author, body, created) VALUES (?, 'ann', 'nice', 100)",
            [b.0],
        )
        .unwrap();
        // Give the connection back; the test pool only has one
        drop(conn);

        let page = blog.article_detail(b).unwrap();
        assert_eq!(page.previous.as_ref().unwrap().id, a);
        assert_eq!(page.next.as_ref().unwrap().id, c);
        assert_eq!(page.comments.len(), 1);
        assert_eq!(page.comments[0].author, "ann");
    }

    #[test]
    fn test_anonymous_writers_are_sent_to_login() {
        let (_db, blog) = blog();
        let id = create(&blog, U, &form("a", "x"));

        let outcome = blog
            .article_create(Identity::Anonymous, Method::Get, None)
            .unwrap();
        assert_eq!(outcome, Outcome::Redirect(Route::Login));

        let outcome = blog
            .article_update(Identity::Anonymous, id, Method::Post, Some(&form("b", "y")))
            .unwrap();
        assert_eq!(outcome, Outcome::Redirect(Route::Login));

        let route = blog
            .article_delete(Identity::Anonymous, id, Method::Post)
            .unwrap();
        assert_eq!(route, Route::Login);
    }

    #[test]
    fn test_create_get_shows_the_form_with_columns() {
        let (db, blog) = blog();
        let tech = SqliteColumnsForTest(&db).create("tech");

        let outcome = blog.article_create(U, Method::Get, None).unwrap();
        match outcome {
            Outcome::Page(page) => assert_eq!(page.columns, vec![tech]),
            Outcome::Redirect(_) => panic!("expected the form page"),
        }
    }

    #[test]
    fn test_create_rejects_invalid_form_without_persisting() {
        let (_db, blog) = blog();

        let err = blog
            .article_create(U, Method::Post, Some(&form("", "body")))
            .unwrap_err();
        assert!(matches!(err, HandlerError::Validation(_)));

        let listing = blog.article_list(&ListParams::default()).unwrap();
        assert!(listing.articles.items.is_empty());
    }

    #[test]
    fn test_create_with_column_and_tags() {
        let (db, blog) = blog();
        let tech = SqliteColumnsForTest(&db).create("tech");

        let mut f = form("Hello", "World");
        f.column = tech.id.to_string();
        f.tags = vec!["rust".into(), " ".into(), "web".into()];
        let id = create(&blog, U, &f);

        let page = blog.article_detail(id).unwrap();
        assert_eq!(page.article.column, Some(tech.id));
        assert_eq!(page.article.tags, vec!["rust".to_string(), "web".to_string()]);
        assert!(page.article.has_tag("rust"));
        assert!(!page.article.has_tag("python"));
    }

    #[test]
    fn test_create_with_unknown_column_is_a_validation_error() {
        let (_db, blog) = blog();

        let mut f = form("Hello", "World");
        f.column = "42".into();
        let err = blog.article_create(U, Method::Post, Some(&f)).unwrap_err();
        assert!(matches!(err, HandlerError::Validation(_)));
    }

    #[test]
    fn test_create_stores_the_attachment_as_cover() {
        let (_db, blog) = blog();

        let mut f = form("Hello", "World");
        f.attachment = Some(Attachment {
            file_name: "../cover image.png".into(),
            content: vec![1, 2, 3],
        });
        let id = create(&blog, U, &f);

        let cover = blog.article_detail(id).unwrap().article.cover.unwrap();
        assert!(cover.ends_with("cover_image.png"));
        assert_eq!(std::fs::read(&cover).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_only_the_author_may_update_or_delete() {
        let (_db, blog) = blog();
        let id = create(&blog, U, &form("Hello", "World"));

        let err = blog
            .article_update(V, id, Method::Post, Some(&form("Stolen", "text")))
            .unwrap_err();
        assert!(matches!(err, HandlerError::Forbidden));

        let err = blog.article_delete(V, id, Method::Post).unwrap_err();
        assert!(matches!(err, HandlerError::Forbidden));

        // The article is unchanged
        let page = blog.article_detail(id).unwrap();
        assert_eq!(page.article.title, "Hello");
    }

    #[test]
    fn test_update_overwrites_fields_and_touches_timestamp() {
        let (_db, blog) = blog();
        let id = create(&blog, U, &form("Hello", "World"));
        let before = blog.article_detail(id).unwrap().article;

        let outcome = blog
            .article_update(U, id, Method::Post, Some(&form("Hi", "Universe")))
            .unwrap();
        assert_eq!(outcome, Outcome::Redirect(Route::ArticleDetail(id)));

        let after = blog.article_detail(id).unwrap().article;
        assert_eq!(after.title, "Hi");
        assert_eq!(after.body, "Universe");
        assert_eq!(after.created, before.created);
        assert!(after.updated >= before.updated);
    }

    #[test]
    fn test_update_get_returns_current_values() {
        let (_db, blog) = blog();
        let id = create(&blog, U, &form("Hello", "World"));

        let outcome = blog.article_update(U, id, Method::Get, None).unwrap();
        match outcome {
            Outcome::Page(page) => assert_eq!(page.article.title, "Hello"),
            Outcome::Redirect(_) => panic!("expected the form page"),
        }
    }

    #[test]
    fn test_update_with_sentinel_clears_the_column() {
        let (db, blog) = blog();
        let tech = SqliteColumnsForTest(&db).create("tech");

        let mut f = form("Hello", "World");
        f.column = tech.id.to_string();
        let id = create(&blog, U, &f);
        assert!(blog.article_detail(id).unwrap().article.column.is_some());

        blog.article_update(U, id, Method::Post, Some(&form("Hello", "World")))
            .unwrap();

        assert!(blog.article_detail(id).unwrap().article.column.is_none());
    }

    #[test]
    fn test_delete_requires_post() {
        let (_db, blog) = blog();
        let id = create(&blog, U, &form("Hello", "World"));

        let err = blog.article_delete(U, id, Method::Get).unwrap_err();
        assert!(matches!(err, HandlerError::MethodNotAllowed));
        assert!(blog.article_detail(id).is_ok());
    }

    #[test]
    fn test_delete_removes_the_article() {
        let (_db, blog) = blog();
        let id = create(&blog, U, &form("Hello", "World"));

        let route = blog.article_delete(U, id, Method::Post).unwrap();
        assert_eq!(route, Route::ArticleList);

        let err = blog.article_detail(id).unwrap_err();
        assert!(matches!(err, HandlerError::NotFound(_)));
    }

    #[test]
    fn test_like_twice_adds_exactly_two() {
        let (_db, blog) = blog();
        let id = create(&blog, U, &form("Hello", "World"));

        blog.article_like(id, Method::Post).unwrap();
        blog.article_like(id, Method::Post).unwrap();

        assert_eq!(blog.article_detail(id).unwrap().article.likes, 2);

        let err = blog.article_like(id, Method::Get).unwrap_err();
        assert!(matches!(err, HandlerError::MethodNotAllowed));

        let err = blog.article_like(ArticleId(99), Method::Post).unwrap_err();
        assert!(matches!(err, HandlerError::NotFound(_)));
    }

    #[test]
    fn test_listing_paginates_and_echoes() {
        let (_db, blog) = blog();
        for i in 0..4 {
            create(&blog, U, &form(&format!("Article {}", i), "body"));
        }

        let params = ListParams {
            search: Some("article".into()),
            page: Some("2".into()),
            ..Default::default()
        };
        let listing = blog.article_list(&params).unwrap();

        // Default page size is 3: four matches make two pages
        assert_eq!(listing.articles.num_pages, 2);
        assert_eq!(listing.articles.number, 2);
        assert_eq!(listing.articles.items.len(), 1);
        assert!(listing.articles.has_previous());
        assert_eq!(listing.echo.search, "article");
        assert_eq!(listing.echo.order, "");
    }

    #[test]
    fn test_listing_orders_by_views_on_request() {
        let (_db, blog) = blog();
        let a = create(&blog, U, &form("a", "x"));
        let b = create(&blog, U, &form("b", "x"));

        // Two reads for a, one for b
        blog.article_detail(a).unwrap();
        blog.article_detail(a).unwrap();
        blog.article_detail(b).unwrap();

        let params = ListParams {
            order: Some("total_views".into()),
            ..Default::default()
        };
        let listing = blog.article_list(&params).unwrap();

        assert_eq!(listing.articles.items[0].id, a);
        assert_eq!(listing.articles.items[1].id, b);
        assert_eq!(listing.echo.order, "total_views");
    }

    struct SqliteColumnsForTest<'a>(&'a Database);

    impl SqliteColumnsForTest<'_> {
        fn create(&self, name: &str) -> Column {
            use crate::base::repository::ColumnRepository as _;
            self.0.column_repository().create_column(name).unwrap()
        }
    }
}
