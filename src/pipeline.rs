//! Pipeline orchestration: ties the OCR driver, preprocessor, scorer,
//! hybrid extractor, parser, router, and event sink together for a single
//! file. Shared by the `watch` and `route` CLI commands.

use std::path::Path;

use chrono::Utc;

use crate::config::Config;
use crate::events::EventSink;
use crate::models::{IntakeFile, OcrAttempt, ProcessingEvent};
use crate::ocr::{OcrBackend, Rasterizer};
use crate::router::{route, RouteOutcome};
use crate::{hybrid, parser, preprocess, scoring};

pub struct Pipeline<'a> {
    pub config: &'a Config,
    pub backend: &'a dyn OcrBackend,
    pub rasterizer: &'a Rasterizer,
    pub sink: &'a dyn EventSink,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        backend: &'a dyn OcrBackend,
        rasterizer: &'a Rasterizer,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self { config, backend, rasterizer, sink }
    }

    /// Run the full extract → parse → route → emit sequence for one file,
    /// per spec §2's data-flow line. Never panics: any internal failure is
    /// reduced to the Failed routing decision, matching §7's propagation
    /// policy.
    pub fn process_one(&self, intake: &IntakeFile) -> RouteOutcome {
        let corpus = self.extract_text(intake);
        let fields = parser::parse(&corpus);

        let outcome = route(self.config, &intake.path, intake.ext, &fields)
            .unwrap_or_else(|_| self.emergency_outcome(intake));

        self.emit_event(intake, &fields, &outcome);
        outcome
    }

    /// Standard + (for PDFs) hybrid extraction, returning the best-scoring
    /// text corpus to hand to the parser.
    fn extract_text(&self, intake: &IntakeFile) -> String {
        let mut attempts = Vec::new();
        let mut ordinal = 0usize;

        if intake.ext.is_image() {
            if let Ok(image) = image::open(&intake.path) {
                for &variant in preprocess::STANDARD_VARIANTS {
                    let bitmap = preprocess::apply(&image, variant);
                    if let Some(attempt) = self.run_ocr_variant(&bitmap, variant, ordinal) {
                        attempts.push(attempt);
                        ordinal += 1;
                    }
                }
            }
        } else if let Ok(work_dir) = tempfile::tempdir() {
            if let Ok(page_path) =
                self.rasterizer
                    .rasterize_page(&intake.path, 1, self.config.standard_dpi, work_dir.path())
            {
                if let Ok(image) = image::open(&page_path) {
                    for &variant in preprocess::STANDARD_VARIANTS {
                        let bitmap = preprocess::apply(&image, variant);
                        if let Some(attempt) = self.run_ocr_variant(&bitmap, variant, ordinal) {
                            attempts.push(attempt);
                            ordinal += 1;
                        }
                    }
                }
            }
        }

        let mut corpus = scoring::best(&attempts).map(|a| a.text.clone()).unwrap_or_default();

        if !intake.ext.is_image() {
            let hybrid_corpus = hybrid::extract(&intake.path, self.config, self.backend, self.rasterizer);
            corpus.push('\n');
            corpus.push_str(&hybrid_corpus);
        }

        corpus
    }

    fn run_ocr_variant(
        &self,
        bitmap: &image::DynamicImage,
        variant: crate::models::PreprocessVariant,
        ordinal: usize,
    ) -> Option<OcrAttempt> {
        let tmp = tempfile::Builder::new().suffix(".png").tempfile().ok()?;
        bitmap.save(tmp.path()).ok()?;
        let text = self.backend.ocr_image(tmp.path()).ok()?;
        let score = scoring::score(&text);
        Some(OcrAttempt {
            variant,
            config_label: "default".to_string(),
            text,
            score,
            ordinal,
        })
    }

    fn emergency_outcome(&self, intake: &IntakeFile) -> RouteOutcome {
        let failed_dir = self.config.bucket_dir(crate::models::DestinationBucket::Failed);
        let _ = std::fs::create_dir_all(&failed_dir);
        let name = intake.path.file_name().and_then(|n| n.to_str()).unwrap_or("unknown");
        let destination = crate::router::resolve_collision(&failed_dir.join(name));
        let _ = std::fs::rename(&intake.path, &destination);
        RouteOutcome {
            decision: crate::models::RoutingDecision::Failed,
            destination,
        }
    }

    fn emit_event(
        &self,
        intake: &IntakeFile,
        fields: &crate::models::ExtractedFields,
        outcome: &RouteOutcome,
    ) {
        let event = ProcessingEvent {
            original_filename: file_name(&intake.path),
            final_filename: outcome.destination.file_name().and_then(|n| n.to_str()).map(String::from),
            file_size: intake.size,
            status: outcome.decision.as_str().to_string(),
            extracted_name: fields.name(),
            extracted_account: fields.account.clone(),
            destination_path: Some(outcome.destination.clone()),
            error_message: None,
            timestamp: Utc::now(),
        };
        self.sink.emit(event);
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("unknown").to_string()
}
