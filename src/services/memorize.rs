//! 暗记卡组服务
//!
//! 主题名称去除首尾空白后必须唯一；删除主题时一并删除其卡片。

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::memorize::{Card, Subject};
use crate::models::memorize_repository::{CardRepository, SubjectRepository};

/// 暗记卡组服务 trait
#[async_trait]
pub trait MemorizeService: Send + Sync {
    /// 全部主题（带卡片数量），最新在前
    async fn list_subjects(&self) -> Result<Vec<Subject>>;

    async fn create_subject(&self, name: &str, description: Option<&str>) -> Result<Subject>;

    async fn get_subject(&self, id: &str) -> Result<Subject>;

    /// 删除主题及其全部卡片
    async fn delete_subject(&self, id: &str) -> Result<()>;

    async fn list_cards(&self, subject_id: &str) -> Result<Vec<Card>>;

    async fn create_card(&self, subject_id: &str, question: &str, answer: &str) -> Result<Card>;

    async fn update_card(&self, id: &str, question: &str, answer: &str) -> Result<Card>;

    async fn delete_card(&self, id: &str) -> Result<()>;
}

/// 暗记卡组服务实现
pub struct MemorizeServiceImpl {
    subjects: Arc<dyn SubjectRepository>,
    cards: Arc<dyn CardRepository>,
}

impl MemorizeServiceImpl {
    pub fn new(subjects: Arc<dyn SubjectRepository>, cards: Arc<dyn CardRepository>) -> Self {
        Self { subjects, cards }
    }

    fn subject_not_found() -> AppError {
        AppError::NotFound("주제를 찾을 수 없습니다.".to_string())
    }

    fn card_not_found() -> AppError {
        AppError::NotFound("카드를 찾을 수 없습니다.".to_string())
    }

    fn check_card(question: &str, answer: &str) -> Result<()> {
        if question.trim().is_empty() {
            return Err(AppError::Validation("문제가 필수입니다.".to_string()));
        }
        if answer.trim().is_empty() {
            return Err(AppError::Validation("답이 필수입니다.".to_string()));
        }
        Ok(())
    }

    async fn existing_subject(&self, id: &str) -> Result<Subject> {
        self.subjects
            .get_by_id(id)
            .await?
            .ok_or_else(Self::subject_not_found)
    }
}

#[async_trait]
impl MemorizeService for MemorizeServiceImpl {
    async fn list_subjects(&self) -> Result<Vec<Subject>> {
        let subjects = self.subjects.list().await?;
        let mut counted = Vec::with_capacity(subjects.len());
        for subject in subjects {
            let count = self.cards.count_by_subject(&subject.id).await?;
            counted.push(subject.with_card_count(count));
        }
        Ok(counted)
    }

    async fn create_subject(&self, name: &str, description: Option<&str>) -> Result<Subject> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("주제 이름이 필수입니다.".to_string()));
        }
        if self.subjects.find_by_name(name).await?.is_some() {
            return Err(AppError::Validation("이미 존재하는 주제 이름입니다.".to_string()));
        }

        let subject = Subject::new(name, description.map(str::trim).unwrap_or_default());
        let created = self.subjects.create(&subject).await?;
        tracing::info!(subject_id = %created.id, "Memorize subject created");
        Ok(created)
    }

    async fn get_subject(&self, id: &str) -> Result<Subject> {
        let subject = self.existing_subject(id).await?;
        let count = self.cards.count_by_subject(id).await?;
        Ok(subject.with_card_count(count))
    }

    async fn delete_subject(&self, id: &str) -> Result<()> {
        self.existing_subject(id).await?;
        let removed = self.cards.delete_by_subject(id).await?;
        if !self.subjects.delete(id).await? {
            return Err(Self::subject_not_found());
        }
        tracing::info!(subject_id = %id, cards = removed, "Memorize subject deleted");
        Ok(())
    }

    async fn list_cards(&self, subject_id: &str) -> Result<Vec<Card>> {
        self.existing_subject(subject_id).await?;
        self.cards.list_by_subject(subject_id).await
    }

    async fn create_card(&self, subject_id: &str, question: &str, answer: &str) -> Result<Card> {
        Self::check_card(question, answer)?;
        self.existing_subject(subject_id).await?;

        let card = Card::new(subject_id, question.trim(), answer.trim());
        let created = self.cards.create(&card).await?;
        tracing::debug!(card_id = %created.id, subject_id = %subject_id, "Memorize card created");
        Ok(created)
    }

    async fn update_card(&self, id: &str, question: &str, answer: &str) -> Result<Card> {
        Self::check_card(question, answer)?;
        let mut card = self.cards.get_by_id(id).await?.ok_or_else(Self::card_not_found)?;
        card.edit(question.trim(), answer.trim());
        self.cards.update(&card).await?.ok_or_else(Self::card_not_found)
    }

    async fn delete_card(&self, id: &str) -> Result<()> {
        if !self.cards.delete(id).await? {
            return Err(Self::card_not_found());
        }
        Ok(())
    }
}

/// 创建暗记卡组服务
pub fn create_memorize_service(
    subjects: Arc<dyn SubjectRepository>,
    cards: Arc<dyn CardRepository>,
) -> Arc<dyn MemorizeService> {
    Arc::new(MemorizeServiceImpl::new(subjects, cards))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::memorize_repository::{InMemoryCardRepository, InMemorySubjectRepository};

    fn service() -> MemorizeServiceImpl {
        MemorizeServiceImpl::new(
            Arc::new(InMemorySubjectRepository::new()),
            Arc::new(InMemoryCardRepository::new()),
        )
    }

    #[tokio::test]
    async fn test_subject_names_are_trimmed_and_unique() {
        let service = service();
        let subject = service.create_subject("  한자  ", Some(" 기초 ")).await.unwrap();
        assert_eq!(subject.name, "한자");
        assert_eq!(subject.description, "기초");

        assert!(matches!(
            service.create_subject("한자", None).await,
            Err(AppError::Validation(msg)) if msg.contains("이미 존재")
        ));
        assert!(matches!(
            service.create_subject("   ", None).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_subjects_carry_card_counts() {
        let service = service();
        let hanja = service.create_subject("한자", None).await.unwrap();
        let english = service.create_subject("영어", None).await.unwrap();
        service.create_card(&hanja.id, "水", "물 수").await.unwrap();
        service.create_card(&hanja.id, "火", "불 화").await.unwrap();

        let subjects = service.list_subjects().await.unwrap();
        let count_of = |id: &str| subjects.iter().find(|s| s.id == id).map(|s| s.card_count);
        assert_eq!(count_of(&hanja.id), Some(2));
        assert_eq!(count_of(&english.id), Some(0));
        assert_eq!(service.get_subject(&hanja.id).await.unwrap().card_count, 2);
    }

    #[tokio::test]
    async fn test_card_validation_and_missing_subject() {
        let service = service();
        let subject = service.create_subject("한자", None).await.unwrap();

        assert!(matches!(
            service.create_card(&subject.id, " ", "답").await,
            Err(AppError::Validation(msg)) if msg == "문제가 필수입니다."
        ));
        assert!(matches!(
            service.create_card(&subject.id, "문제", "").await,
            Err(AppError::Validation(msg)) if msg == "답이 필수입니다."
        ));
        assert!(matches!(
            service.create_card("no-such-subject", "문제", "답").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete_card() {
        let service = service();
        let subject = service.create_subject("한자", None).await.unwrap();
        let card = service.create_card(&subject.id, "木", "나무").await.unwrap();

        let updated = service.update_card(&card.id, " 木 ", " 나무 목 ").await.unwrap();
        assert_eq!(updated.question, "木");
        assert_eq!(updated.answer, "나무 목");
        assert!(matches!(
            service.update_card("missing", "문제", "답").await,
            Err(AppError::NotFound(_))
        ));

        service.delete_card(&card.id).await.unwrap();
        assert!(matches!(service.delete_card(&card.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_subject_removes_its_cards() {
        let service = service();
        let subject = service.create_subject("한자", None).await.unwrap();
        let card = service.create_card(&subject.id, "金", "쇠 금").await.unwrap();

        service.delete_subject(&subject.id).await.unwrap();
        assert!(matches!(service.get_subject(&subject.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            service.update_card(&card.id, "金", "쇠").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_subject(&subject.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
