//! Build-path benchmarks: container load, normalization and cache encoding

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lectern_core::cache::{codec, SourceSignature};
use lectern_core::{normalize, EpubBuilder};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const CHAPTERS: usize = 40;

fn chapter(i: usize) -> String {
    let paragraphs: String = (0..60)
        .map(|p| {
            format!(
                "<p id=\"c{i}p{p}\">Paragraph {p} of chapter {i} with <em>emphasis</em>, \
                 <a href=\"chapter{next}.xhtml#c{next}p0\">a link</a> and some more words.</p>",
                next = (i + 1) % CHAPTERS
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <html xmlns=\"http://www.w3.org/1999/xhtml\"><head><title>{i}</title></head>\
         <body><h1>Chapter {i}</h1>{paragraphs}</body></html>"
    )
}

fn sample_epub() -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut out));
        let options = SimpleFileOptions::default();

        zip.start_file("mimetype", options).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();
        zip.start_file("META-INF/container.xml", options).unwrap();
        zip.write_all(
            br#"<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container"><rootfiles><rootfile full-path="content.opf" media-type="application/oebps-package+xml"/></rootfiles></container>"#,
        )
        .unwrap();

        let mut manifest = String::new();
        let mut spine = String::new();
        for i in 0..CHAPTERS {
            manifest.push_str(&format!(
                "<item id=\"c{i}\" href=\"chapter{i}.xhtml\" media-type=\"application/xhtml+xml\"/>"
            ));
            spine.push_str(&format!("<itemref idref=\"c{i}\"/>"));
            zip.start_file(format!("chapter{i}.xhtml"), options).unwrap();
            zip.write_all(chapter(i).as_bytes()).unwrap();
        }
        zip.start_file("content.opf", options).unwrap();
        zip.write_all(
            format!(
                "<package xmlns=\"http://www.idpf.org/2007/opf\" version=\"3.0\">\
                 <metadata xmlns:dc=\"http://purl.org/dc/elements/1.1/\"><dc:title>Bench</dc:title></metadata>\
                 <manifest>{manifest}</manifest><spine>{spine}</spine></package>"
            )
            .as_bytes(),
        )
        .unwrap();
        zip.finish().unwrap();
    }
    out
}

fn build_benchmark(c: &mut Criterion) {
    let epub = sample_epub();
    let builder = EpubBuilder::new();

    c.bench_function("build_book", |b| {
        b.iter(|| {
            builder
                .build_from_reader(Cursor::new(black_box(epub.as_slice())))
                .unwrap()
        })
    });

    let html = chapter(0);
    c.bench_function("normalize_chapter", |b| {
        b.iter(|| {
            normalize(
                "chapter0.xhtml",
                black_box(html.as_bytes()),
                "application/xhtml+xml",
            )
            .unwrap()
        })
    });

    let book = builder.build_from_reader(Cursor::new(epub.as_slice())).unwrap();
    let signature = SourceSignature {
        size: epub.len() as u64,
        modified_ns: 0,
    };
    let encoded = codec::encode(&signature, &book).unwrap();

    c.bench_function("cache_encode", |b| {
        b.iter(|| codec::encode(&signature, black_box(&book)).unwrap())
    });
    c.bench_function("cache_decode", |b| {
        b.iter(|| codec::decode(black_box(&encoded)).unwrap())
    });
}

criterion_group!(benches, build_benchmark);
criterion_main!(benches);
