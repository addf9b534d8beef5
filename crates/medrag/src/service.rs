//! Upload and ask pipelines over the shared knowledge base

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::ingestion::{Ingestor, UploadedFile};
use crate::providers::{embedder_from_config, EmbeddingProvider, GeminiClient, LlmProvider};
use crate::retrieval::KnowledgeBase;

/// Reply when a question arrives before any upload
pub const NOT_READY_MESSAGE: &str = "Knowledge base is not ready. Please upload PDFs first.";
/// Reply when the model returns nothing or fails
pub const DECLINED_MESSAGE: &str = "Sorry, but I think Gemini didn't want to answer that!";

/// Result of asking a question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    /// Nothing has been ingested yet
    NotReady,
    /// Model answer, verbatim
    Answered(String),
    /// The model returned no text or the call failed
    Declined,
}

impl AskOutcome {
    /// Text shown to the user
    pub fn message(&self) -> &str {
        match self {
            Self::NotReady => NOT_READY_MESSAGE,
            Self::Answered(answer) => answer,
            Self::Declined => DECLINED_MESSAGE,
        }
    }
}

/// Summary of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    /// Files in the batch
    pub files: usize,
    /// Page documents added
    pub documents: usize,
    /// Index size after the upload
    pub index_size: usize,
}

/// Retrieval-augmented answering over uploaded PDFs
pub struct RagService {
    knowledge_base: KnowledgeBase,
    ingestor: Ingestor,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
}

impl RagService {
    /// Assemble a service from its parts
    pub fn new(
        knowledge_base: KnowledgeBase,
        ingestor: Ingestor,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            knowledge_base,
            ingestor,
            embedder,
            llm,
            top_k,
        }
    }

    /// Build providers and open the knowledge base from configuration
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let embedder = embedder_from_config(&config.embeddings)?;
        let llm: Arc<dyn LlmProvider> = Arc::new(GeminiClient::new(&config.llm)?);
        let knowledge_base = KnowledgeBase::open(
            &config.storage.snapshot_path,
            embedder.fingerprint(),
            config.retrieval.metric,
        )?;
        let ingestor = Ingestor::new(&config.storage.upload_dir, config.storage.retention);

        Ok(Self::new(
            knowledge_base,
            ingestor,
            embedder,
            llm,
            config.retrieval.top_k,
        ))
    }

    /// Shared knowledge base
    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    /// Generative provider
    pub fn llm(&self) -> &dyn LlmProvider {
        self.llm.as_ref()
    }

    /// Number of passages retrieved per question
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Ingest a batch of PDFs: extract pages, embed them, and commit them to the index.
    ///
    /// Either the whole batch is committed (memory and snapshot) or nothing is.
    pub async fn upload(&self, files: &[UploadedFile]) -> Result<UploadReport> {
        let documents = self.ingestor.ingest(files).await?;
        if documents.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let texts: Vec<String> = documents.iter().map(|d| d.text().to_string()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        let added = documents.len();
        let index_size = self.knowledge_base.add_batch(documents, embeddings).await?;

        tracing::info!(
            "Indexed {} pages from {} files ({} documents total)",
            added,
            files.len(),
            index_size
        );

        Ok(UploadReport {
            files: files.len(),
            documents: added,
            index_size,
        })
    }

    /// Answer a question from the top-k retrieved pages.
    ///
    /// Generation failures are logged and reported as [`AskOutcome::Declined`];
    /// embedding and retrieval failures are returned as errors.
    pub async fn ask(&self, question: &str) -> Result<AskOutcome> {
        let Some(index) = self.knowledge_base.snapshot() else {
            tracing::info!("Question received before any upload");
            return Ok(AskOutcome::NotReady);
        };

        let query_vector = self.embedder.embed(question).await?;
        let results = index.query(&query_vector, self.top_k)?;
        tracing::debug!("Retrieved {} passages", results.len());

        let context = PromptBuilder::build_context(&results);
        let prompt = PromptBuilder::build_prompt(question, &context);

        match self.llm.generate(&prompt).await {
            Ok(answer) if !answer.is_empty() => Ok(AskOutcome::Answered(answer)),
            Ok(_) => {
                tracing::warn!("{} returned an empty answer", self.llm.name());
                Ok(AskOutcome::Declined)
            }
            Err(e) => {
                tracing::error!("Answer generation failed: {}", e);
                Ok(AskOutcome::Declined)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::UploadRetention;
    use crate::ingestion::pdf_with_pages;
    use crate::providers::EmbedderFingerprint;
    use crate::retrieval::DistanceMetric;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::Path;

    const DIMS: usize = 16;

    /// Bag-of-words embedder: each lowercase word bumps one bucket
    pub(crate) struct WordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for WordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut vector = vec![0.0; DIMS];
            for word in text
                .to_lowercase()
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
            {
                let bucket = word.bytes().fold(0usize, |acc, b| acc * 31 + b as usize) % DIMS;
                vector[bucket] += 1.0;
            }
            Ok(vector)
        }

        fn dimensions(&self) -> usize {
            DIMS
        }

        fn model(&self) -> &str {
            "bag-of-words"
        }

        fn name(&self) -> &str {
            "test"
        }
    }

    /// How the fake model replies
    pub(crate) enum Reply {
        Text(&'static str),
        Fail,
    }

    /// Fake model that records every prompt it receives
    pub(crate) struct RecordingLlm {
        reply: Reply,
        pub(crate) prompts: Mutex<Vec<String>>,
    }

    impl RecordingLlm {
        pub(crate) fn new(reply: Reply) -> Self {
            Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for RecordingLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            match self.reply {
                Reply::Text(text) => Ok(text.to_string()),
                Reply::Fail => Err(Error::llm("quota exceeded")),
            }
        }

        fn name(&self) -> &str {
            "recording"
        }

        fn model(&self) -> &str {
            "fake-model"
        }
    }

    pub(crate) fn service(dir: &Path, llm: Arc<RecordingLlm>) -> RagService {
        let embedder = WordEmbedder;
        let knowledge_base = KnowledgeBase::open(
            dir.join("vector_store.json"),
            embedder.fingerprint(),
            DistanceMetric::Euclidean,
        )
        .unwrap();
        RagService::new(
            knowledge_base,
            Ingestor::new(dir.join("uploads"), UploadRetention::Retain),
            Arc::new(embedder),
            llm,
            4,
        )
    }

    #[tokio::test]
    async fn test_ask_before_upload_is_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(RecordingLlm::new(Reply::Text("unused")));
        let service = service(dir.path(), llm.clone());

        let outcome = service.ask("What reduces fever?").await.unwrap();
        assert_eq!(outcome, AskOutcome::NotReady);
        assert_eq!(outcome.message(), NOT_READY_MESSAGE);
        assert!(llm.prompts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_aspirin_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(RecordingLlm::new(Reply::Text("Aspirin.")));
        let service = service(dir.path(), llm.clone());

        let report = service
            .upload(&[UploadedFile::new(
                "aspirin.pdf",
                pdf_with_pages(&["Aspirin reduces fever."]),
            )])
            .await
            .unwrap();
        assert_eq!(report.documents, 1);
        assert_eq!(report.index_size, 1);

        let outcome = service.ask("What reduces fever?").await.unwrap();
        assert_eq!(outcome.message(), "Aspirin.");

        let prompts = llm.prompts.lock();
        let prompt = &prompts[0];
        let persona = prompt.find("You are the best doctor.").unwrap();
        let domain = prompt.find("Only provide medical-related answers.").unwrap();
        let context = prompt.find("Aspirin reduces fever").unwrap();
        let question = prompt.find("What reduces fever?").unwrap();
        assert!(persona < domain && domain < context && context < question);
    }

    #[tokio::test]
    async fn test_empty_or_failed_generation_falls_back() {
        let pdf = pdf_with_pages(&["Aspirin reduces fever."]);

        for reply in [Reply::Text(""), Reply::Fail] {
            let dir = tempfile::tempdir().unwrap();
            let service = service(dir.path(), Arc::new(RecordingLlm::new(reply)));
            service
                .upload(&[UploadedFile::new("aspirin.pdf", pdf.clone())])
                .await
                .unwrap();

            let outcome = service.ask("What reduces fever?").await.unwrap();
            assert_eq!(outcome, AskOutcome::Declined);
            assert_eq!(outcome.message(), DECLINED_MESSAGE);
        }
    }

    #[tokio::test]
    async fn test_non_empty_answer_is_returned_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), Arc::new(RecordingLlm::new(Reply::Text(" \n"))));
        service
            .upload(&[UploadedFile::new(
                "aspirin.pdf",
                pdf_with_pages(&["Aspirin reduces fever."]),
            )])
            .await
            .unwrap();

        let outcome = service.ask("What reduces fever?").await.unwrap();
        assert_eq!(outcome, AskOutcome::Answered(" \n".to_string()));
        assert_eq!(outcome.message(), " \n");
    }

    #[tokio::test]
    async fn test_rejected_upload_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path(), Arc::new(RecordingLlm::new(Reply::Text("x"))));
        let snapshot_path = dir.path().join("vector_store.json");

        assert!(matches!(service.upload(&[]).await, Err(Error::NoFileSelected)));
        assert!(matches!(
            service.upload(&[UploadedFile::new("", Vec::new())]).await,
            Err(Error::NoFileSelected)
        ));
        assert!(!service.knowledge_base().is_ready());
        assert!(!snapshot_path.exists());

        service
            .upload(&[UploadedFile::new("a.pdf", pdf_with_pages(&["Rest helps."]))])
            .await
            .unwrap();
        let on_disk = std::fs::read(&snapshot_path).unwrap();

        let result = service
            .upload(&[
                UploadedFile::new("b.pdf", pdf_with_pages(&["Fluids help."])),
                UploadedFile::new("c.pdf", b"corrupt".to_vec()),
            ])
            .await;
        assert!(matches!(result, Err(Error::FileParse { .. })));
        assert_eq!(service.knowledge_base().len(), 1);
        assert_eq!(std::fs::read(&snapshot_path).unwrap(), on_disk);
    }

    #[tokio::test]
    async fn test_retrieval_spans_batches_and_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(RecordingLlm::new(Reply::Text("ok")));
        let service = service(dir.path(), llm.clone());

        service
            .upload(&[UploadedFile::new(
                "first.pdf",
                pdf_with_pages(&["Aspirin reduces fever.", "Sleep restores energy."]),
            )])
            .await
            .unwrap();
        let report = service
            .upload(&[UploadedFile::new(
                "second.pdf",
                pdf_with_pages(&["Ibuprofen reduces swelling."]),
            )])
            .await
            .unwrap();
        assert_eq!(report.index_size, 3);

        service.ask("What reduces swelling?").await.unwrap();
        service.ask("What reduces swelling?").await.unwrap();

        let prompts = llm.prompts.lock();
        assert_eq!(prompts[0], prompts[1]);
        // k is capped at the three indexed pages, all of which reach the context
        assert!(prompts[0].contains("Ibuprofen reduces swelling"));
        assert!(prompts[0].contains("Aspirin reduces fever"));
        assert!(prompts[0].contains("Sleep restores energy"));
    }

    #[tokio::test]
    async fn test_restart_reads_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let llm = Arc::new(RecordingLlm::new(Reply::Text("Aspirin.")));
        {
            let service = service(dir.path(), llm.clone());
            service
                .upload(&[UploadedFile::new(
                    "aspirin.pdf",
                    pdf_with_pages(&["Aspirin reduces fever."]),
                )])
                .await
                .unwrap();
        }

        let restarted = service(dir.path(), llm);
        assert_eq!(restarted.knowledge_base().len(), 1);
        let outcome = restarted.ask("What reduces fever?").await.unwrap();
        assert_eq!(outcome, AskOutcome::Answered("Aspirin.".to_string()));
    }

    #[test]
    fn test_word_embedder_fingerprint() {
        assert_eq!(
            WordEmbedder.fingerprint(),
            EmbedderFingerprint::new("test", "bag-of-words", DIMS)
        );
    }
}
