//! Integration tests for the reader and tokenizer over real sources

use oxidize_pdf_io::bytes::ByteAccumulator;
use oxidize_pdf_io::parser::scan::check_trailer;
use oxidize_pdf_io::parser::{ParseError, TokenType, Tokenizer};
use oxidize_pdf_io::reader::RandomAccessReader;
use oxidize_pdf_io::source::{ArraySource, SourceFactory, SourceStream};
use oxidize_pdf_io::PdfError;
use pretty_assertions::assert_eq;
use std::io::{Read, Write};
use std::thread;
use tempfile::NamedTempFile;

const MINIMAL: &[u8] = b"%PDF-1.7\n1 0 obj<</Type/Catalog>>endobj\nstartxref\n9\n%%EOF";

fn minimal_pdf() -> Vec<u8> {
    let mut pdf = Vec::new();
    pdf.extend_from_slice(b"%PDF-1.4\n");
    pdf.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
    pdf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
    pdf.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");
    pdf.extend_from_slice(b"3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792]\n");
    pdf.extend_from_slice(b"   /Title (Hello \\(World\\)) /Id <48656C6C6F> >>\nendobj\n");
    let xref = pdf.len();
    pdf.extend_from_slice(b"xref\n0 4\n0000000000 65535 f \n");
    pdf.extend_from_slice(b"trailer\n<< /Size 4 /Root 1 0 R >>\n");
    pdf.extend_from_slice(format!("startxref\n{xref}\n%%EOF\n").as_bytes());
    pdf
}

#[test]
fn test_end_to_end_scenario() {
    let mut tokenizer = Tokenizer::from_bytes(MINIMAL);

    assert!(tokenizer.check_pdf_header().unwrap().starts_with("PDF-1.7"));
    let startxref = tokenizer.startxref().unwrap();
    assert_eq!(&MINIMAL[startxref as usize..startxref as usize + 9], b"startxref");

    tokenizer.seek(9);
    let mut tokens = Vec::new();
    for _ in 0..6 {
        tokenizer.next_valid_token().unwrap();
        let value = match tokenizer.token_type() {
            TokenType::Name => tokenizer.string_value(),
            TokenType::Obj => format!(
                "{} {}",
                tokenizer.object_number(),
                tokenizer.generation_number()
            ),
            _ => String::new(),
        };
        tokens.push((tokenizer.token_type(), value));
    }

    assert_eq!(
        tokens,
        vec![
            (TokenType::Obj, "1 0".to_string()),
            (TokenType::StartDict, String::new()),
            (TokenType::Name, "Type".to_string()),
            (TokenType::Name, "Catalog".to_string()),
            (TokenType::EndDict, String::new()),
            (TokenType::EndObj, String::new()),
        ]
    );
}

#[test]
fn test_document_from_file() {
    let pdf = minimal_pdf();
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(&pdf).unwrap();
    temp_file.flush().unwrap();

    let source = SourceFactory::new().create_best_source(temp_file.path()).unwrap();
    let mut tokenizer = Tokenizer::new(RandomAccessReader::from_boxed(source));

    assert_eq!(tokenizer.header_offset().unwrap(), 0);
    assert_eq!(tokenizer.check_pdf_header().unwrap(), "PDF-1.4");

    // startxref points at the xref keyword
    let startxref = tokenizer.startxref().unwrap();
    tokenizer.seek(startxref);
    tokenizer.next_token().unwrap();
    assert_eq!(tokenizer.string_value(), "startxref");
    tokenizer.next_token().unwrap();
    let xref = tokenizer.long_value().unwrap() as u64;
    tokenizer.seek(xref);
    tokenizer.next_token().unwrap();
    assert_eq!(tokenizer.string_value(), "xref");

    // Every indirect reference and every title string
    tokenizer.seek(0);
    let mut references = Vec::new();
    let mut strings = Vec::new();
    loop {
        tokenizer.next_valid_token().unwrap();
        match tokenizer.token_type() {
            TokenType::EndOfFile => break,
            TokenType::Ref => references.push(tokenizer.object_number()),
            TokenType::String => strings.push(tokenizer.decoded_string_content()),
            _ => {}
        }
    }
    assert_eq!(references, vec![2, 3, 2, 1]);
    assert_eq!(strings, vec![b"Hello (World)".to_vec(), b"Hello".to_vec()]);

    let eof = {
        tokenizer.seek(startxref);
        tokenizer.next_eof().unwrap()
    };
    assert_eq!(eof, pdf.len() as u64);
    tokenizer.close().unwrap();
}

#[test]
fn test_recovery_line_scan() {
    let pdf = minimal_pdf();
    let mut tokenizer = Tokenizer::from_bytes(pdf);
    let mut line = ByteAccumulator::with_capacity(64);
    let mut objects = Vec::new();
    let mut trailer_found = false;

    while tokenizer.read_line_segment(line.reset(), true).unwrap() {
        if check_trailer(&line) {
            trailer_found = true;
        }
        if let Some(header) = Tokenizer::object_header(line.as_bytes()) {
            objects.push(header);
        }
    }

    assert!(trailer_found);
    assert_eq!(objects, vec![(1, 0), (2, 0), (3, 0)]);
}

#[test]
fn test_reader_views_across_threads() {
    let data: Vec<u8> = (0..=255).collect();
    let mut reader = RandomAccessReader::new(ArraySource::new(data));
    reader.seek(100);

    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let mut view = reader.create_view();
            thread::spawn(move || {
                view.seek(t * 64);
                let mut buf = [0u8; 64];
                view.read_fully(&mut buf).unwrap();
                assert_eq!(buf[0], (t * 64) as u8);
                assert_eq!(buf[63], (t * 64 + 63) as u8);
                view.close().unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Closing views left the shared source open, and the cursor untouched
    assert_eq!(reader.position(), 100);
    assert_eq!(reader.read().unwrap(), Some(100));
}

#[test]
fn test_reader_push_back_keeps_source_position() {
    let mut reader = RandomAccessReader::new(ArraySource::new(b"pdf".to_vec()));
    reader.read().unwrap();
    reader.read().unwrap();
    reader.push_back(b'd');
    assert_eq!(reader.position(), 1);
    assert_eq!(reader.read().unwrap(), Some(b'd'));
    assert_eq!(reader.position(), 2);
    assert_eq!(reader.read().unwrap(), Some(b'f'));
    assert_eq!(reader.read().unwrap(), None);
    assert!(matches!(reader.read_u16(), Err(PdfError::UnexpectedEof)));
}

#[test]
fn test_syntax_errors_carry_position() {
    let mut tokenizer = Tokenizer::from_bytes(&b"/Ok <0g>"[..]);
    tokenizer.next_token().unwrap();
    match tokenizer.next_token() {
        Err(ParseError::SyntaxError { position, .. }) => assert_eq!(position, 7),
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn test_source_stream_reads_tokenizable_bytes() {
    let mut stream = SourceStream::new(ArraySource::new(MINIMAL.to_vec()));
    let mut header = [0u8; 8];
    stream.read_exact(&mut header).unwrap();
    assert_eq!(&header, b"%PDF-1.7");
}
