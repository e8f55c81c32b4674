//! End-to-end extraction scenarios over realistic result mails.
//!
//! Each test feeds raw upload bytes through `ExtractionPipeline` (or a
//! single extractor) and checks the laps and session metadata that come out.

use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{NaiveDate, NaiveTime};
use kartlog_core::LapRecord;
use kartlog_ingest::extract::{
    DetailedLapTableExtractor, GenericHtmlTableExtractor, LooseLineHeuristicExtractor,
    SequentialSingleDriverExtractor, SpanishDetailedResultsExtractor,
};
use kartlog_ingest::{default_extractors, ExtractionPipeline, LapExtractor, TrackCatalog};

fn pipeline() -> ExtractionPipeline {
    ExtractionPipeline::new(Arc::new(TrackCatalog::builtin()))
}

const FASTKART_TXT: &str = "Fastkart Elche\n\
    Resumen de tu carrera\n\
    Sesión 17 - 2    14 Vueltas\n\
    07/11/2025 12:48\n\
    Pilotos N. V. Mejor V. en V. GAP\n\
    1 TheMaksoo TB 29 14 01:05.432 7\n\
    RESULTADOS DETALLADOS\n\
    1 01:07.478\n\
    2 01:06.120\n\
    01:05.900\n\
    4 01:05.432\n\
    Avg. 01:06.233\n";

/// A Spanish results mail is handled by the Spanish extractor alone: every
/// earlier extractor finds nothing, and the pipeline returns exactly what
/// that extractor returns.
#[test]
fn test_spanish_fixture_reaches_its_extractor() {
    let result = pipeline().extract(FASTKART_TXT.as_bytes(), Some("fastkart.txt"));
    assert_eq!(result.extractor.as_deref(), Some("spanish_detailed_results"));

    let direct = SpanishDetailedResultsExtractor.extract_text(FASTKART_TXT);
    assert_eq!(result.laps, direct);
    assert_eq!(result.laps.len(), 4);

    let info = &result.session_info;
    assert_eq!(info.detected_track_name.as_deref(), Some("Fastkart Elche"));
    assert_eq!(info.detected_date, NaiveDate::from_ymd_opt(2025, 11, 7));
    assert_eq!(info.detected_time, NaiveTime::from_hms_opt(12, 48, 0));
    assert_eq!(info.session_number.as_deref(), Some("17"));
}

const FASTKART_HTML: &str = "<html><body>\
    <h2>Fastkart Elche</h2>\
    <p>Resumen de tu carrera</p>\
    <p>Sesión 17 - 2&nbsp;&nbsp;14 Vueltas</p>\
    <p>07/11/2025 12:48</p>\
    <table>\
    <tr><th>Pilotos</th><th>N. V.</th><th>Mejor V.</th><th>en V.</th><th>GAP</th></tr>\
    <tr><td>1</td><td>TheMaksoo</td><td>TB 29</td><td>14</td><td>01:05.432</td><td>7</td></tr>\
    </table>\
    <p>RESULTADOS DETALLADOS</p>\
    <table>\
    <tr><td>1</td><td>01:07.478</td></tr>\
    <tr><td>2</td><td>01:06.120</td></tr>\
    <tr><td>3</td><td>01:05.900</td></tr>\
    <tr><td>4</td><td>01:05.432</td></tr>\
    <tr><td>Avg.</td><td>01:06.233</td></tr>\
    </table></body></html>";

/// The same Spanish results sent as HTML: the venue heading and the
/// one-cell-per-line rendering must not pull the mail into the generic
/// table or single-driver extractors.
#[test]
fn test_spanish_html_mail_reaches_its_extractor() {
    let raw = format!(
        "From: Fastkart <info@fastkart.example>\r\n\
         Subject: Resultados de tu carrera\r\n\
         Content-Type: text/html; charset=utf-8\r\n\r\n{}",
        FASTKART_HTML
    );
    let p = pipeline();
    let result = p.extract(raw.as_bytes(), Some("fastkart.eml"));
    assert_eq!(result.extractor.as_deref(), Some("spanish_detailed_results"));
    assert_eq!(result.driver_names(), vec!["TheMaksoo"]);
    assert!(result.laps.iter().all(|l| l.kart_number.as_deref() == Some("TB 29")));
    assert!(result.laps.iter().all(|l| l.position == Some(1)));

    let from_text = p.extract(FASTKART_TXT.as_bytes(), Some("fastkart.txt"));
    assert_eq!(result.laps, from_text.laps);

    let info = &result.session_info;
    assert_eq!(info.detected_track_name.as_deref(), Some("Fastkart Elche"));
    assert_eq!(info.detected_date, NaiveDate::from_ymd_opt(2025, 11, 7));
    assert_eq!(info.detected_time, NaiveTime::from_hms_opt(12, 48, 0));
    assert_eq!(info.session_number.as_deref(), Some("17"));
}

/// The detailed grid from the README example: driver-major output with
/// column rank as position.
#[test]
fn test_detailed_grid_email() {
    let html = "<html><body><p>Race overzicht</p><p>Detailed results</p><table>\
        <tr><td></td><td>Alice</td><td>Bob</td></tr>\
        <tr><td>1</td><td>34.500</td><td>35.000</td></tr>\
        <tr><td>2</td><td>34.200</td><td>35.600</td></tr>\
        </table></body></html>";
    let raw = format!(
        "From: info@circuitpark.example\r\nSubject: Jouw race\r\nContent-Type: text/html; charset=utf-8\r\n\r\n{}",
        html
    );
    let result = pipeline().extract(raw.as_bytes(), Some("race.eml"));

    assert_eq!(result.extractor.as_deref(), Some("detailed_lap_table"));
    let laps: Vec<(&str, Option<u32>, f64)> = result
        .laps
        .iter()
        .map(|l| (l.driver_name.as_str(), l.lap_number, l.lap_time))
        .collect();
    assert_eq!(
        laps,
        vec![
            ("Alice", Some(1), 34.5),
            ("Alice", Some(2), 34.2),
            ("Bob", Some(1), 35.0),
            ("Bob", Some(2), 35.6),
        ]
    );
    assert_eq!(
        result.session_info.detected_track_name.as_deref(),
        Some("Circuit Park Berghem")
    );
}

/// A Lot66 mail, base64 encoded, yields one lap for the named driver.
#[test]
fn test_lot66_base64_email() {
    let body = "Lot66\n07.11.2025 At 12:48\nMax van Lierop\n1\nLap 1\n-\n-\n-\n00:35.560\n";
    let encoded = general_purpose::STANDARD.encode(body);
    let wrapped: Vec<&str> = encoded
        .as_bytes()
        .chunks(76)
        .map(|c| std::str::from_utf8(c).unwrap())
        .collect();
    let raw = format!(
        "Subject: Your session\nContent-Type: text/plain; charset=utf-8\nContent-Transfer-Encoding: base64\n\n{}\n",
        wrapped.join("\n")
    );

    let result = pipeline().extract(raw.as_bytes(), None);
    assert_eq!(result.laps.len(), 1);
    let lap = &result.laps[0];
    assert_eq!(lap.driver_name, "Max van Lierop");
    assert_eq!(lap.lap_number, Some(1));
    assert!((lap.lap_time - 35.56).abs() < 1e-9);
    assert_eq!(
        result.session_info.detected_track_name.as_deref(),
        Some("Lot66")
    );
    assert_eq!(
        result.session_info.detected_time,
        NaiveTime::from_hms_opt(12, 48, 0)
    );
}

/// The venue printed above the driver's name is not taken as the driver.
#[test]
fn test_venue_heading_before_driver() {
    let raw = b"Subject: Je sessie\n\n\
        De Voltage\nMax van Lierop\n07.11.2025 At 12:48\n1\nLap 1\n-\n-\n-\n00:35.560\n";
    let result = pipeline().extract(raw, None);
    assert_eq!(result.extractor.as_deref(), Some("sequential_single_driver"));
    assert_eq!(result.driver_names(), vec!["Max van Lierop"]);
    assert_eq!(
        result.session_info.detected_track_name.as_deref(),
        Some("De Voltage")
    );
}

/// A flattened text grid where one driver has no time on a lap keeps the
/// remaining times under the right driver.
#[test]
fn test_text_grid_with_empty_cell() {
    let raw = b"Subject: Race overzicht\n\n\
        Detailed results\n\tAlice\tBob\n1\t\t35.000\n2\t34.200\t35.600\nAvg.\n";
    let result = pipeline().extract(raw, None);
    assert_eq!(result.extractor.as_deref(), Some("detailed_lap_table"));
    let laps: Vec<(&str, Option<u32>, f64)> = result
        .laps
        .iter()
        .map(|l| (l.driver_name.as_str(), l.lap_number, l.lap_time))
        .collect();
    assert_eq!(
        laps,
        vec![
            ("Alice", Some(2), 34.2),
            ("Bob", Some(1), 35.0),
            ("Bob", Some(2), 35.6),
        ]
    );
}

/// A multipart mail whose text part is declared windows-1252: names are
/// decoded with that charset, not guessed.
#[test]
fn test_multipart_windows_1252_part() {
    let mut raw = b"From: uitslag@goodwill.example\r\n\
        Subject: Uitslag\r\n\
        MIME-Version: 1.0\r\n\
        Content-Type: multipart/alternative; boundary=\"part\"\r\n\r\n\
        --part\r\nContent-Type: text/html; charset=windows-1252\r\n\r\n<p>Zie de uitslag</p>\r\n\
        --part\r\nContent-Type: text/plain; charset=windows-1252\r\n\
        Content-Transfer-Encoding: 8bit\r\n\r\n\
        Uitslag\r\n1. Jos\xe9 Garc\xeda 34.500\r\n2. Toma\x9a Horvat 35.120\r\n"
        .to_vec();
    raw.extend_from_slice(
        b"Bedankt voor je bezoek en tot de volgende keer op onze baan in Veenendaal.\r\n--part--\r\n",
    );

    let result = pipeline().extract(&raw, Some("uitslag.eml"));
    assert_eq!(result.extractor.as_deref(), Some("loose_line_heuristic"));
    assert_eq!(result.driver_names(), vec!["José García", "Tomaš Horvat"]);
    assert_eq!(result.laps[1].position, Some(2));
    assert_eq!(
        result.session_info.detected_track_name.as_deref(),
        Some("Goodwill Karting")
    );
}

/// A multipart/alternative mail with a quoted-printable HTML results table.
#[test]
fn test_multipart_quoted_printable_results_table() {
    let html = "<html><body><h1>Karten sessie 4</h1><p>Datum: 21.11.2024 19:30</p>=\r\n\
        <table><tr><th>Pos</th><th>Kart</th><th>Naam</th><th>Rondes</th><th>Beste</th></tr>=\r\n\
        <tr><td>1</td><td>12</td><td>Max van Lierop</td><td>14</td><td>27.912</td></tr>=\r\n\
        <tr><td>2</td><td>7</td><td>Sanne de Vries</td><td>14</td><td>28.340</td></tr>=\r\n\
        </table><p>Tot ziens in het caf=C3=A9</p></body></html>";
    let plain = "Bekijk deze mail in een HTML-lezer om je resultaten te zien. \
        Deze tekst is het alternatief voor oudere mailprogramma's.";
    let raw = format!(
        "From: De Voltage <noreply@devoltage.example>\r\n\
         Subject: Uitslag\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: multipart/alternative;\r\n\tboundary=\"==b1==\"\r\n\r\n\
         --==b1==\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}\r\n\
         --==b1==\r\nContent-Type: text/html; charset=utf-8\r\n\
         Content-Transfer-Encoding: quoted-printable\r\n\r\n{}\r\n\
         --==b1==--\r\n",
        plain, html
    );

    let result = pipeline().extract(raw.as_bytes(), Some("uitslag.eml"));
    assert_eq!(result.extractor.as_deref(), Some("generic_html_table"));
    assert_eq!(result.laps.len(), 2);
    assert_eq!(result.laps[0].kart_number.as_deref(), Some("12"));
    assert_eq!(result.laps[1].position, Some(2));

    let info = &result.session_info;
    assert_eq!(info.detected_track_name.as_deref(), Some("De Voltage"));
    assert_eq!(info.session_number.as_deref(), Some("4"));
    assert_eq!(info.detected_date, NaiveDate::from_ymd_opt(2024, 11, 21));
    assert_eq!(info.detected_time, NaiveTime::from_hms_opt(19, 30, 0));
}

/// Prose without lap times, and empty input, produce no laps.
#[test]
fn test_no_data_is_empty_not_error() {
    let p = pipeline();
    assert!(p.extract(b"", None).laps.is_empty());

    let prose = b"Subject: Thanks for visiting\n\nWe hope you enjoyed your evening on track.\nSee you next time!";
    let result = p.extract(prose, Some("thanks.eml"));
    assert!(result.laps.is_empty());
    assert!(result.extractor.is_none());
}

/// Track identification: catalog-order substring matching.
#[test]
fn test_track_identification() {
    let catalog = TrackCatalog::builtin();
    assert_eq!(
        catalog
            .identify(&["subject: Lot66 session recap"])
            .map(|t| t.canonical_name.as_str()),
        Some("Lot66")
    );
    assert!(catalog.identify(&["completely unrelated text"]).is_none());
}

const IMPLAUSIBLE_FIXTURES: &[&str] = &[
    "Detailed results\n\tAlice\tBob\n1\t0.000\t5:01.000\n2\t34.100\t-0.500\n",
    "<table><tr><td>1</td><td>Alice</td><td>0.000</td></tr><tr><td>2</td><td>Bob</td><td>5:00.000</td></tr></table>",
    "Max van Lierop\n1\nLap 1\n00:00.000\n2\nLap 2\n9:59.999\n3\nLap 3\n00:36.000\n",
    "RESULTADOS DETALLADOS\nPiloto: Ana\n1 0.000\n2 5:01.000\n3 01:02.000\n",
    "Alice 0.000\nBob -34.500\nCarla 5:01.000\nDave 301.000\n",
];

/// Times of zero or at least 300 seconds never reach the output.
#[test]
fn test_implausible_times_never_emitted() {
    for fixture in IMPLAUSIBLE_FIXTURES {
        for extractor in default_extractors() {
            for lap in extractor.extract_text(fixture) {
                assert!(
                    lap.lap_time > 0.0 && lap.lap_time < 300.0,
                    "{} emitted {} from {:?}",
                    extractor.name(),
                    lap.lap_time,
                    fixture
                );
            }
        }
    }
}

fn assert_plausible(source: &str, laps: &[LapRecord]) {
    for lap in laps {
        assert!(
            !lap.driver_name.trim().is_empty(),
            "{} emitted a blank driver name",
            source
        );
        assert!(
            lap.lap_time > 0.0 && lap.lap_time < 300.0,
            "{} emitted {} for {:?}",
            source,
            lap.lap_time,
            lap.driver_name
        );
    }
}

fn pseudo_random_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as u8
        })
        .collect()
}

/// Garbage and truncated inputs never panic, through any extractor or the
/// whole pipeline.
#[test]
fn test_garbage_never_panics() {
    let mut inputs: Vec<Vec<u8>> = vec![
        Vec::new(),
        b"\n\n\n".to_vec(),
        b"Content-Type: multipart/mixed; boundary=x\n\n--x\n--x--".to_vec(),
        b"Content-Transfer-Encoding: base64\n\n====".to_vec(),
        b"Content-Transfer-Encoding: quoted-printable\n\n=\n=A=".to_vec(),
        b"<tr><td>1</td><td>\xff\xfe</td><td>34.500</td></tr>".to_vec(),
        b"Detailed results\n1\n2\n3".to_vec(),
        b"RESULTADOS DETALLADOS\nPiloto:\n01:02.000".to_vec(),
        "Sesión ñ 1:2:3.4.5 ::: ... 99:99.999 \u{1F3CE}".as_bytes().to_vec(),
    ];
    for seed in 0..32 {
        inputs.push(pseudo_random_bytes(seed, 64 + seed as usize * 37));
    }

    let p = pipeline();
    let extractors: Vec<Box<dyn LapExtractor>> = vec![
        Box::new(DetailedLapTableExtractor),
        Box::new(GenericHtmlTableExtractor),
        Box::new(SequentialSingleDriverExtractor),
        Box::new(SpanishDetailedResultsExtractor),
        Box::new(LooseLineHeuristicExtractor),
    ];
    for input in &inputs {
        let result = p.extract(input, Some("garbage.bin"));
        assert_plausible("pipeline", &result.laps);
        let text = String::from_utf8_lossy(input);
        for extractor in &extractors {
            assert_plausible(extractor.name(), &extractor.extract_text(&text));
        }
    }
}
