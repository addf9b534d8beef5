//! Document ingestion: upload storage and per-page PDF extraction

mod parser;
mod uploads;

pub use parser::{PageText, PdfParser};
pub use uploads::{sanitize_filename, Ingestor, UploadedFile};

#[cfg(test)]
pub(crate) use parser::tests::pdf_with_pages;
