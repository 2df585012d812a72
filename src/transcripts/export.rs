//! Transcript rendering for the download routes.

use anyhow::Context;
use docx_rs::{Docx, Paragraph, Run};

use super::repo::Transcript;

/// Render a transcript as plain text: title, blank line, body.
pub fn render_txt(record: &Transcript) -> String {
    format!("{}\n\n{}\n", record.title, record.transcript)
}

/// Render a transcript as a .docx document: bold title paragraph followed
/// by one paragraph per transcript line.
pub fn render_docx(record: &Transcript) -> anyhow::Result<Vec<u8>> {
    let mut docx = Docx::new().add_paragraph(
        Paragraph::new().add_run(Run::new().add_text(record.title.as_str()).bold().size(32)),
    );

    for line in record.transcript.lines() {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)));
    }

    let mut cursor = std::io::Cursor::new(Vec::new());
    docx.build().pack(&mut cursor).context("pack docx")?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn record(text: &str) -> Transcript {
        Transcript {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "meeting.webm".into(),
            transcript: text.into(),
            audio_filename: "meeting.webm".into(),
            duration_seconds: 4.2,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn txt_contains_title_and_body() {
        let out = render_txt(&record("hello world"));
        assert!(out.starts_with("meeting.webm\n\n"));
        assert!(out.contains("hello world"));
    }

    #[test]
    fn docx_is_a_zip_container() {
        let bytes = render_docx(&record("first line\nsecond line")).expect("render docx");
        // .docx is an OPC zip; check the magic instead of unpacking.
        assert!(bytes.len() > 4);
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn docx_renders_empty_transcript() {
        let bytes = render_docx(&record("")).expect("render docx");
        assert_eq!(&bytes[..2], b"PK");
    }
}
