//! Synthetic data for development databases.

use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use fake::faker::address::en::CountryName;
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::{DomainSuffix, SafeEmail, Username};
use fake::faker::lorem::en::{Paragraph, Sentence};
use fake::faker::name::en::Name;
use fake::{Fake, Faker};
use model::entities::book::BookStatus;
use model::entities::comment::{self, CommentStatus};
use model::entities::{author, book, editor, user};
use model::roles::{ROLE_BOOK_CREATE, ROLE_BOOK_EDIT};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Iterable, Set, TransactionTrait};
use tracing::{debug, info};

use crate::auth::password::PasswordHasher;

/// Password given to every generated user.
pub const FIXTURE_PASSWORD: &str = "password";

/// How many rows of each kind to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureCounts {
    pub authors: usize,
    pub editors: usize,
    pub users: usize,
    pub books: usize,
    pub comments: usize,
}

impl Default for FixtureCounts {
    fn default() -> Self {
        Self {
            authors: 50,
            editors: 20,
            users: 5,
            books: 100,
            comments: 0,
        }
    }
}

fn pick<T>(items: &[T]) -> &T {
    &items[(0..items.len()).fake::<usize>()]
}

fn random_date(from: NaiveDate, span_days: i64) -> NaiveDate {
    from + Duration::days((0..span_days).fake::<i64>())
}

fn random_past_moment(max_days: i64) -> NaiveDateTime {
    Utc::now().naive_utc() - Duration::minutes((0..max_days * 24 * 60).fake::<i64>())
}

/// A random ISBN-13 in the 978 prefix with a correct check digit.
pub fn fake_isbn13() -> String {
    let mut digits = vec![9, 7, 8];
    digits.extend((0..9).map(|_| (0..10).fake::<u32>()));
    let weighted: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
        .sum();
    digits.push((10 - weighted % 10) % 10);
    digits.iter().map(|d| d.to_string()).collect()
}

pub struct AuthorFactory;

impl AuthorFactory {
    pub fn build() -> author::ActiveModel {
        let born = random_date(
            NaiveDate::from_ymd_opt(1800, 1, 1).unwrap_or_default(),
            190 * 365,
        );
        let died = Faker
            .fake::<bool>()
            .then(|| born + Duration::days((20 * 365..90 * 365).fake::<i64>()));
        author::ActiveModel {
            name: Set(Name().fake()),
            date_of_birth: Set(born),
            date_of_death: Set(died),
            nationality: Set(Some(CountryName().fake())),
            ..Default::default()
        }
    }

    pub async fn create<C: ConnectionTrait>(conn: &C) -> Result<author::Model, DbErr> {
        Self::build().insert(conn).await
    }
}

pub struct EditorFactory;

impl EditorFactory {
    pub fn build() -> editor::ActiveModel {
        let name: String = CompanyName().fake();
        let slug: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        let suffix: String = DomainSuffix().fake();
        editor::ActiveModel {
            website: Set(Some(format!("https://www.{slug}.{suffix}"))),
            name: Set(name),
            country: Set(Some(CountryName().fake())),
            ..Default::default()
        }
    }

    pub async fn create<C: ConnectionTrait>(conn: &C) -> Result<editor::Model, DbErr> {
        Self::build().insert(conn).await
    }
}

pub struct UserFactory;

impl UserFactory {
    /// `sequence` keeps usernames unique within one run.
    pub fn build(password_hash: &str, sequence: usize) -> user::ActiveModel {
        let role_sets: [&[&str]; 3] = [&[], &[ROLE_BOOK_CREATE], &[ROLE_BOOK_CREATE, ROLE_BOOK_EDIT]];
        let base: String = Username().fake();
        user::ActiveModel {
            username: Set(format!("{base}{sequence}")),
            password: Set(password_hash.to_string()),
            roles: Set(user::encode_roles(pick(&role_sets).iter())),
            last_connected_at: Set(None),
            ..Default::default()
        }
    }

    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        password_hash: &str,
        sequence: usize,
    ) -> Result<user::Model, DbErr> {
        Self::build(password_hash, sequence).insert(conn).await
    }
}

pub struct BookFactory;

impl BookFactory {
    pub fn build(author_id: i32, editor_id: i32, created_by_id: i32) -> book::ActiveModel {
        let statuses: Vec<BookStatus> = BookStatus::iter().collect();
        let title: String = Sentence(2..6).fake();
        book::ActiveModel {
            title: Set(title.trim_end_matches('.').to_string()),
            isbn: Set(fake_isbn13()),
            cover: Set(format!(
                "https://picsum.photos/seed/{}/330/500",
                (0..1_000_000).fake::<u32>()
            )),
            page_number: Set((40..1200).fake::<i32>()),
            plot: Set(Paragraph(2..5).fake()),
            status: Set(*pick(&statuses)),
            edited_at: Set(random_past_moment(20 * 365)),
            editor_id: Set(editor_id),
            author_id: Set(author_id),
            created_by_id: Set(created_by_id),
            ..Default::default()
        }
    }
}

pub struct CommentFactory;

impl CommentFactory {
    pub fn build(book_id: i32) -> comment::ActiveModel {
        let statuses: Vec<CommentStatus> = CommentStatus::iter().collect();
        let status = *pick(&statuses);
        let created_at = random_past_moment(365);
        comment::ActiveModel {
            book_id: Set(book_id),
            name: Set(Name().fake()),
            email: Set(SafeEmail().fake()),
            created_at: Set(created_at),
            published_at: Set(comment::publication_date(status, None, created_at)),
            status: Set(status),
            content: Set(Paragraph(1..3).fake()),
            ..Default::default()
        }
    }
}

/// Picks one of `ids`, creating a fresh row first when there are none.
async fn pick_or_create<F, Fut>(ids: &mut Vec<i32>, create: F) -> Result<i32>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<i32>>,
{
    if ids.is_empty() {
        let id = create().await?;
        ids.push(id);
        debug!(id, "Created missing fixture dependency");
    }
    Ok(*pick(ids))
}

/// Generates `counts` rows in a single transaction.
pub async fn load_fixtures<C>(db: &C, counts: FixtureCounts, hasher: &PasswordHasher) -> Result<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    info!(?counts, "Loading fixtures");
    let txn = db.begin().await?;

    let mut authors = Vec::with_capacity(counts.authors);
    for _ in 0..counts.authors {
        authors.push(AuthorFactory::create(&txn).await?.id);
    }

    let mut editors = Vec::with_capacity(counts.editors);
    for _ in 0..counts.editors {
        editors.push(EditorFactory::create(&txn).await?.id);
    }

    // Hashed once and shared by every generated user.
    let password_hash = hasher.hash(FIXTURE_PASSWORD)?;
    let mut users = Vec::with_capacity(counts.users);
    for sequence in 0..counts.users {
        users.push(UserFactory::create(&txn, &password_hash, sequence).await?.id);
    }

    let mut books = Vec::with_capacity(counts.books);
    for _ in 0..counts.books {
        let author_id = pick_or_create(&mut authors, || async {
            Ok::<_, anyhow::Error>(AuthorFactory::create(&txn).await?.id)
        })
        .await?;
        let editor_id = pick_or_create(&mut editors, || async {
            Ok::<_, anyhow::Error>(EditorFactory::create(&txn).await?.id)
        })
        .await?;
        let created_by_id = pick_or_create(&mut users, || async {
            Ok::<_, anyhow::Error>(
                UserFactory::create(&txn, &password_hash, counts.users).await?.id,
            )
        })
        .await?;
        let book = BookFactory::build(author_id, editor_id, created_by_id)
            .insert(&txn)
            .await?;
        books.push(book.id);
    }

    if counts.comments > 0 && !books.is_empty() {
        for _ in 0..counts.comments {
            CommentFactory::build(*pick(&books)).insert(&txn).await?;
        }
    }

    txn.commit().await?;
    info!(
        authors = authors.len(),
        editors = editors.len(),
        users = users.len(),
        books = books.len(),
        comments = counts.comments,
        "Fixtures loaded"
    );
    Ok(())
}
