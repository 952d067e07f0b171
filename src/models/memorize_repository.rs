//! Subject / Card 仓储

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::memorize::{Card, Subject};
use crate::storage::surrealdb::{CountRow, SurrealPool};

/// Subject 仓储 trait
#[async_trait]
pub trait SubjectRepository: Send + Sync {
    async fn create(&self, subject: &Subject) -> Result<Subject>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Subject>>;

    /// 按名称精确查找
    async fn find_by_name(&self, name: &str) -> Result<Option<Subject>>;

    /// 全部主题，最新在前
    async fn list(&self) -> Result<Vec<Subject>>;

    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Card 仓储 trait
#[async_trait]
pub trait CardRepository: Send + Sync {
    async fn create(&self, card: &Card) -> Result<Card>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Card>>;

    /// 某主题下的卡片，最新在前
    async fn list_by_subject(&self, subject_id: &str) -> Result<Vec<Card>>;

    async fn count_by_subject(&self, subject_id: &str) -> Result<u64>;

    async fn update(&self, card: &Card) -> Result<Option<Card>>;

    async fn delete(&self, id: &str) -> Result<bool>;

    /// 删除某主题下的全部卡片，返回删除条数
    async fn delete_by_subject(&self, subject_id: &str) -> Result<u64>;
}

/// 数据库中的主题行，卡片数量不落库
#[derive(Debug, Serialize, Deserialize)]
struct SubjectRow {
    subject_id: String,
    name: String,
    #[serde(default)]
    description: String,
    created_at: DateTime<Utc>,
    created_ts: i64,
    updated_at: DateTime<Utc>,
}

impl From<&Subject> for SubjectRow {
    fn from(subject: &Subject) -> Self {
        Self {
            subject_id: subject.id.clone(),
            name: subject.name.clone(),
            description: subject.description.clone(),
            created_at: subject.created_at,
            created_ts: subject.created_at.timestamp_millis(),
            updated_at: subject.updated_at,
        }
    }
}

impl From<SubjectRow> for Subject {
    fn from(row: SubjectRow) -> Self {
        Self {
            id: row.subject_id,
            name: row.name,
            description: row.description,
            card_count: 0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// 数据库中的卡片行
#[derive(Debug, Serialize, Deserialize)]
struct CardRow {
    card_id: String,
    subject_id: String,
    question: String,
    answer: String,
    created_at: DateTime<Utc>,
    created_ts: i64,
    updated_at: DateTime<Utc>,
}

impl From<&Card> for CardRow {
    fn from(card: &Card) -> Self {
        Self {
            card_id: card.id.clone(),
            subject_id: card.subject_id.clone(),
            question: card.question.clone(),
            answer: card.answer.clone(),
            created_at: card.created_at,
            created_ts: card.created_at.timestamp_millis(),
            updated_at: card.updated_at,
        }
    }
}

impl From<CardRow> for Card {
    fn from(row: CardRow) -> Self {
        Self {
            id: row.card_id,
            subject_id: row.subject_id,
            question: row.question,
            answer: row.answer,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Subject 仓储实现（SurrealDB）
#[derive(Clone)]
pub struct SubjectRepositoryImpl {
    pool: SurrealPool,
}

impl SubjectRepositoryImpl {
    pub fn new(pool: SurrealPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubjectRepository for SubjectRepositoryImpl {
    async fn create(&self, subject: &Subject) -> Result<Subject> {
        let db = self.pool.inner().await?;
        db.query("CREATE memorize_subject CONTENT $data RETURN NONE")
            .bind(("data", SubjectRow::from(subject)))
            .await?
            .check()?;
        Ok(subject.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Subject>> {
        let db = self.pool.inner().await?;
        let mut response = db
            .query("SELECT * OMIT id FROM memorize_subject WHERE subject_id = $subject_id LIMIT 1")
            .bind(("subject_id", id.to_string()))
            .await?;
        let rows: Vec<SubjectRow> = response.take(0)?;
        Ok(rows.into_iter().next().map(Subject::from))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Subject>> {
        let db = self.pool.inner().await?;
        let mut response = db
            .query("SELECT * OMIT id FROM memorize_subject WHERE name = $name LIMIT 1")
            .bind(("name", name.to_string()))
            .await?;
        let rows: Vec<SubjectRow> = response.take(0)?;
        Ok(rows.into_iter().next().map(Subject::from))
    }

    async fn list(&self) -> Result<Vec<Subject>> {
        let db = self.pool.inner().await?;
        let mut response = db
            .query("SELECT * OMIT id FROM memorize_subject ORDER BY created_ts DESC")
            .await?;
        let rows: Vec<SubjectRow> = response.take(0)?;
        Ok(rows.into_iter().map(Subject::from).collect())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(false);
        }
        let db = self.pool.inner().await?;
        db.query("DELETE memorize_subject WHERE subject_id = $subject_id")
            .bind(("subject_id", id.to_string()))
            .await?
            .check()?;
        Ok(true)
    }
}

/// Card 仓储实现（SurrealDB）
#[derive(Clone)]
pub struct CardRepositoryImpl {
    pool: SurrealPool,
}

impl CardRepositoryImpl {
    pub fn new(pool: SurrealPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CardRepository for CardRepositoryImpl {
    async fn create(&self, card: &Card) -> Result<Card> {
        let db = self.pool.inner().await?;
        db.query("CREATE memorize_card CONTENT $data RETURN NONE")
            .bind(("data", CardRow::from(card)))
            .await?
            .check()?;
        Ok(card.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Card>> {
        let db = self.pool.inner().await?;
        let mut response = db
            .query("SELECT * OMIT id FROM memorize_card WHERE card_id = $card_id LIMIT 1")
            .bind(("card_id", id.to_string()))
            .await?;
        let rows: Vec<CardRow> = response.take(0)?;
        Ok(rows.into_iter().next().map(Card::from))
    }

    async fn list_by_subject(&self, subject_id: &str) -> Result<Vec<Card>> {
        let db = self.pool.inner().await?;
        let mut response = db
            .query(
                "SELECT * OMIT id FROM memorize_card \
                 WHERE subject_id = $subject_id ORDER BY created_ts DESC",
            )
            .bind(("subject_id", subject_id.to_string()))
            .await?;
        let rows: Vec<CardRow> = response.take(0)?;
        Ok(rows.into_iter().map(Card::from).collect())
    }

    async fn count_by_subject(&self, subject_id: &str) -> Result<u64> {
        let db = self.pool.inner().await?;
        let mut response = db
            .query("SELECT count() FROM memorize_card WHERE subject_id = $subject_id GROUP ALL")
            .bind(("subject_id", subject_id.to_string()))
            .await?;
        let row: Option<CountRow> = response.take(0)?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }

    async fn update(&self, card: &Card) -> Result<Option<Card>> {
        if self.get_by_id(&card.id).await?.is_none() {
            return Ok(None);
        }
        let db = self.pool.inner().await?;
        db.query("UPDATE memorize_card MERGE $data WHERE card_id = $card_id RETURN NONE")
            .bind(("card_id", card.id.clone()))
            .bind(("data", CardRow::from(card)))
            .await?
            .check()?;
        Ok(Some(card.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(false);
        }
        let db = self.pool.inner().await?;
        db.query("DELETE memorize_card WHERE card_id = $card_id")
            .bind(("card_id", id.to_string()))
            .await?
            .check()?;
        Ok(true)
    }

    async fn delete_by_subject(&self, subject_id: &str) -> Result<u64> {
        let total = self.count_by_subject(subject_id).await?;
        let db = self.pool.inner().await?;
        db.query("DELETE memorize_card WHERE subject_id = $subject_id")
            .bind(("subject_id", subject_id.to_string()))
            .await?
            .check()?;
        Ok(total)
    }
}

/// Subject 仓储实现（进程内）
#[derive(Default)]
pub struct InMemorySubjectRepository {
    subjects: DashMap<String, Subject>,
}

impl InMemorySubjectRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubjectRepository for InMemorySubjectRepository {
    async fn create(&self, subject: &Subject) -> Result<Subject> {
        self.subjects.insert(subject.id.clone(), subject.clone());
        Ok(subject.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Subject>> {
        Ok(self.subjects.get(id).map(|e| e.value().clone()))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Subject>> {
        Ok(self
            .subjects
            .iter()
            .find(|e| e.value().name == name)
            .map(|e| e.value().clone()))
    }

    async fn list(&self) -> Result<Vec<Subject>> {
        let mut subjects: Vec<Subject> = self.subjects.iter().map(|e| e.value().clone()).collect();
        subjects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(subjects)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.subjects.remove(id).is_some())
    }
}

/// Card 仓储实现（进程内）
#[derive(Default)]
pub struct InMemoryCardRepository {
    cards: DashMap<String, Card>,
}

impl InMemoryCardRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CardRepository for InMemoryCardRepository {
    async fn create(&self, card: &Card) -> Result<Card> {
        self.cards.insert(card.id.clone(), card.clone());
        Ok(card.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Card>> {
        Ok(self.cards.get(id).map(|e| e.value().clone()))
    }

    async fn list_by_subject(&self, subject_id: &str) -> Result<Vec<Card>> {
        let mut cards: Vec<Card> = self
            .cards
            .iter()
            .filter(|e| e.value().subject_id == subject_id)
            .map(|e| e.value().clone())
            .collect();
        cards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(cards)
    }

    async fn count_by_subject(&self, subject_id: &str) -> Result<u64> {
        Ok(self
            .cards
            .iter()
            .filter(|e| e.value().subject_id == subject_id)
            .count() as u64)
    }

    async fn update(&self, card: &Card) -> Result<Option<Card>> {
        match self.cards.get_mut(&card.id) {
            Some(mut entry) => {
                *entry = card.clone();
                Ok(Some(card.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.cards.remove(id).is_some())
    }

    async fn delete_by_subject(&self, subject_id: &str) -> Result<u64> {
        let before = self.cards.len();
        self.cards.retain(|_, card| card.subject_id != subject_id);
        Ok((before - self.cards.len()) as u64)
    }
}
