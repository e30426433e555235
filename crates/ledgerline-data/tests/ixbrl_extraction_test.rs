//! Integration tests for inline-XBRL fact extraction

use ledgerline_data::DataError;
use ledgerline_data::ixbrl::{FactExtractor, FactFilter, NO_CONTEXT_REF, is_numeric_token};
use rstest::rstest;
use std::io::Write;

/// A trimmed-down micro-entity accounts document in the shape Companies House serves.
const ACCOUNTS_XHTML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"
      xmlns:ix="http://www.xbrl.org/2013/inlineXBRL"
      xmlns:xbrli="http://www.xbrl.org/2003/instance"
      xmlns:core="http://xbrl.frc.org.uk/fr/2023-01-01/core"
      xmlns:bus="http://xbrl.frc.org.uk/cd/2023-01-01/business">
<head><title>Acme Ltd - Accounts</title></head>
<body>
  <div style="display:none">
    <ix:header>
      <ix:hidden>
        <ix:nonNumeric name="bus:EntityCurrentLegalOrRegisteredName" contextRef="FY2024">ACME LTD</ix:nonNumeric>
      </ix:hidden>
      <ix:resources>
        <xbrli:context id="FY2024"><xbrli:entity><xbrli:identifier scheme="http://www.companieshouse.gov.uk/">01234567</xbrli:identifier></xbrli:entity></xbrli:context>
      </ix:resources>
    </ix:header>
  </div>
  <table>
    <tr>
      <td>Fixed assets</td>
      <td><ix:nonFraction name="core:FixedAssets" contextRef="FY2024" unitRef="GBP" decimals="0" format="ixt:num-dot-decimal">12,500</ix:nonFraction></td>
      <td><ix:nonFraction name="core:FixedAssets" contextRef="FY2023" unitRef="GBP" decimals="0">11,000</ix:nonFraction></td>
    </tr>
    <tr>
      <td>Net current liabilities</td>
      <td>(<ix:nonFraction name="core:NetCurrentAssetsLiabilities" contextRef="FY2024" unitRef="GBP" decimals="0" sign="-">3,200</ix:nonFraction>)</td>
    </tr>
    <tr>
      <td>Average employees</td>
      <td><ix:nonFraction name="core:AverageNumberEmployeesDuringPeriod" contextRef="FY2024" unitRef="pure" decimals="0">4</ix:nonFraction></td>
    </tr>
  </table>
  <p>Director: <ix:nonNumeric name="bus:NameEntityOfficer" contextRef="FY2024">Jane Doe</ix:nonNumeric></p>
  <p>Turnover: <ix:nonFraction name="core:Turnover" contextRef="FY2024">N/A</ix:nonFraction></p>
</body>
</html>
"#;

#[rstest]
#[case::grouped_decimal("1,234.00", true)]
#[case::plain("42", true)]
#[case::zero("0", true)]
#[case::text("N/A", false)]
#[case::parenthesised_negative("(500)", false)]
#[case::minus_negative("-500", false)]
#[case::empty("", false)]
#[case::only_separators(",.", false)]
#[case::currency_prefix("\u{a3}100", false)]
fn test_numeric_filter(#[case] value: &str, #[case] kept: bool) {
    assert_eq!(is_numeric_token(value), kept);
    assert_eq!(FactFilter::NumericOnly.accepts(value), kept);
    assert!(FactFilter::All.accepts(value));
}

#[test]
fn test_accounts_document_numeric_facts() {
    let facts = FactExtractor::new().extract_str(ACCOUNTS_XHTML).unwrap();

    let names: Vec<&str> = facts.names().collect();
    assert_eq!(
        names,
        vec![
            "core:FixedAssets",
            "core:NetCurrentAssetsLiabilities",
            "core:AverageNumberEmployeesDuringPeriod",
        ]
    );

    // Both periods, in document order
    let fixed_assets = facts.get("core:FixedAssets").unwrap();
    assert_eq!(fixed_assets.len(), 2);
    assert_eq!(fixed_assets[0], ("FY2024".to_string(), "12,500".to_string()));
    assert_eq!(fixed_assets[1], ("FY2023".to_string(), "11,000".to_string()));

    // The sign attribute is not applied; the displayed digits are kept
    assert_eq!(
        facts.get("core:NetCurrentAssetsLiabilities").unwrap()[0].1,
        "3,200"
    );

    // Text facts and non-numeric values are dropped
    assert!(facts.get("bus:NameEntityOfficer").is_none());
    assert!(facts.get("core:Turnover").is_none());
}

#[test]
fn test_accounts_document_all_facts() {
    let facts = FactExtractor::with_filter(FactFilter::All)
        .extract_str(ACCOUNTS_XHTML)
        .unwrap();

    assert_eq!(facts.len(), 6);
    assert_eq!(
        facts.get("bus:EntityCurrentLegalOrRegisteredName").unwrap()[0].1,
        "ACME LTD"
    );
    assert_eq!(facts.get("bus:NameEntityOfficer").unwrap()[0].1, "Jane Doe");
    assert_eq!(facts.get("core:Turnover").unwrap()[0].1, "N/A");
}

#[test]
fn test_extraction_is_idempotent() {
    let extractor = FactExtractor::new();
    let first = extractor.extract_str(ACCOUNTS_XHTML).unwrap();
    let second = extractor.extract_str(ACCOUNTS_XHTML).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_extract_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(ACCOUNTS_XHTML.as_bytes()).unwrap();
    file.flush().unwrap();

    let from_file = FactExtractor::new().extract_path(file.path()).unwrap();
    let from_str = FactExtractor::new().extract_str(ACCOUNTS_XHTML).unwrap();
    assert_eq!(from_file, from_str);
}

#[test]
fn test_missing_file_is_extraction_failure() {
    let dir = tempfile::tempdir().unwrap();
    let result = FactExtractor::new().extract_path(&dir.path().join("gone.xhtml"));
    assert!(matches!(result, Err(DataError::ExtractionFailed(_))));
}

#[test]
fn test_not_xml_is_extraction_failure() {
    let result = FactExtractor::new().extract_str("<html><body><p>unclosed</body></html>");
    assert!(matches!(result, Err(DataError::ExtractionFailed(_))));
}

#[test]
fn test_truncated_document_is_extraction_failure() {
    let truncated = &ACCOUNTS_XHTML[..ACCOUNTS_XHTML.find("12,500").unwrap()];
    let result = FactExtractor::new().extract_str(truncated);
    assert!(matches!(result, Err(DataError::ExtractionFailed(_))));
}

#[test]
fn test_document_without_facts_is_empty() {
    let facts = FactExtractor::new()
        .extract_str(r#"<html xmlns="http://www.w3.org/1999/xhtml"><body><p>Scanned accounts</p></body></html>"#)
        .unwrap();
    assert!(facts.is_empty());
}

#[test]
fn test_missing_context_ref_default() {
    let facts = FactExtractor::new()
        .extract_str(r#"<html xmlns:ix="http://www.xbrl.org/2013/inlineXBRL"><ix:nonFraction name="core:Equity">10</ix:nonFraction></html>"#)
        .unwrap();
    assert_eq!(facts.get("core:Equity").unwrap()[0].0, NO_CONTEXT_REF);
}

#[test]
fn test_declared_latin1_encoding_is_honoured() {
    let latin1: &[u8] = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n\
<html xmlns:ix=\"http://www.xbrl.org/2013/inlineXBRL\"><body>\
<p><ix:nonNumeric name=\"bus:TurnoverNote\" contextRef=\"c\">Turnover \xA3</ix:nonNumeric></p>\
<p><ix:nonFraction name=\"core:Equity\" contextRef=\"c\">1,234</ix:nonFraction></p>\
</body></html>";

    let facts = FactExtractor::new().extract_reader(latin1).unwrap();
    assert_eq!(facts.names().collect::<Vec<_>>(), vec!["core:Equity"]);
    assert_eq!(
        facts.get("core:Equity").unwrap()[0],
        ("c".to_string(), "1,234".to_string())
    );

    let all = FactExtractor::with_filter(FactFilter::All)
        .extract_reader(latin1)
        .unwrap();
    assert_eq!(all.get("bus:TurnoverNote").unwrap()[0].1, "Turnover \u{a3}");
}

#[test]
fn test_unknown_entity_keeps_sibling_facts() {
    let xhtml = r#"<html xmlns:ix="http://www.xbrl.org/2013/inlineXBRL"><body>
<ix:nonNumeric name="bus:PolicyNote" contextRef="c">Depreciated at &frac12; rate</ix:nonNumeric>
<ix:nonFraction name="core:Equity" contextRef="c">1,234</ix:nonFraction>
</body></html>"#;

    let facts = FactExtractor::new().extract_str(xhtml).unwrap();
    assert_eq!(facts.get("core:Equity").unwrap()[0].1, "1,234");
    assert!(facts.get("bus:PolicyNote").is_none());

    let all = FactExtractor::with_filter(FactFilter::All)
        .extract_str(xhtml)
        .unwrap();
    assert_eq!(
        all.get("bus:PolicyNote").unwrap()[0].1,
        "Depreciated at &frac12; rate"
    );
}
