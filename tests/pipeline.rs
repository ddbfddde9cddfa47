use std::collections::HashSet;

use partseek::{
    Document,
    SearchConfig,
    find_parts,
    identifier::{IdentifierKind, extract_part_numbers_from_page},
    navigation::{ResolutionStatus, extract_page_reference, is_index_page, process_search_results},
    rules::is_relevant_for_query,
    search::search,
};

/// 214 pages: an index on page 12 pointing at the lubrication page.
fn service_manual() -> Document {
    let pages: Vec<String> = (1..=214)
        .map(|n| match n {
            12 => "INDEX\nEngine Oil Filter . . . . . . . . . . . 214".to_string(),
            214 => "LUBRICATION\nEngine oil filter element\nPart No: RE508960".to_string(),
            _ => format!("Body page {n}"),
        })
        .collect();
    Document::from_page_texts("service.txt", &pages)
}

#[test]
fn index_hit_is_redirected_to_content_page() {
    let doc = service_manual();
    let results = search(&doc, "engine oil filter");
    assert!(results.iter().any(|r| r.location.page_number == 12));

    let processed = process_search_results(results, std::slice::from_ref(&doc), "engine oil filter");
    let hit = processed
        .iter()
        .find(|r| r.index_page_number == Some(12))
        .expect("redirected result");
    assert_eq!(hit.location.page_number, 214);
    assert_eq!(hit.location.line_number, 2);
    assert!(hit.is_followed_from_index);
    assert_eq!(hit.part_number.as_deref(), Some("RE508960"));
    assert_eq!(hit.actual_part_number.as_deref(), Some("RE508960"));
    assert_eq!(hit.resolution, Some(ResolutionStatus::Resolved));
}

#[test]
fn processing_twice_changes_nothing() {
    let doc = service_manual();
    let docs = [doc];
    let once = process_search_results(search(&docs[0], "engine oil filter"), &docs, "engine oil filter");
    let twice = process_search_results(once.clone(), &docs, "engine oil filter");
    assert_eq!(once, twice);
}

#[test]
fn index_line_reference_is_extracted() {
    let page = "Engine Oil Filter . . . . . . . . . . . 214";
    assert!(is_index_page(page));
    assert_eq!(extract_page_reference(page).unwrap().target_page_number, 214);
}

#[test]
fn hvac_air_filter_never_wins() {
    let doc = Document::from_page_texts(
        "tractor.txt",
        &["CAB\nCondenser air filter, operator station AH212121\nRefrigerant lines\nSeat\nMirror\nENGINE\nEngine air intake filter, RE12345\nClamp"],
    );
    let results = search(&doc, "air filter part number");
    assert_eq!(results[0].part_number.as_deref(), Some("RE12345"));
    assert!(results.iter().all(|r| r.part_number.as_deref() != Some("AH212121")));
    assert!(!is_relevant_for_query(
        "CAB Condenser air filter, operator station AH212121 Refrigerant lines",
        "air filter"
    ));
}

#[test]
fn repeated_lines_yield_one_result() {
    let pages = vec!["Oil filter RE504836 spin-on"; 5];
    let doc = Document::from_page_texts("catalog.txt", &pages);
    let results = search(&doc, "oil filter");
    assert_eq!(results.len(), 1);

    let keys: HashSet<_> = results
        .iter()
        .map(|r| (r.part_number.clone(), r.name.to_lowercase()))
        .collect();
    assert_eq!(keys.len(), results.len());
}

#[test]
fn item_numbers_are_kept_apart_from_part_numbers() {
    assert_eq!(IdentifierKind::classify("8843"), IdentifierKind::ItemNumber);
    assert_eq!(IdentifierKind::classify("RE508960"), IdentifierKind::PartNumber);

    let found = extract_part_numbers_from_page("Part No: RE508960 Engine Oil Filter");
    assert_eq!(found[0].value, "RE508960");
    assert!(found[0].confidence >= 80);

    let doc = Document::from_page_texts("diagram.txt", &["8843 Engine oil filter element"]);
    let results = search(&doc, "engine oil filter");
    assert_eq!(results[0].item_number.as_deref(), Some("8843"));
    assert_eq!(results[0].part_number, None);
}

#[test]
fn degenerate_inputs_return_nothing() {
    let doc = service_manual();
    assert!(search(&doc, "").is_empty());
    assert!(search(&doc, " \t ").is_empty());

    let empty = Document::from_pages("empty.txt", Vec::<Vec<String>>::new());
    assert!(search(&empty, "oil filter").is_empty());
    assert!(find_parts(&[], "oil filter", &SearchConfig::default()).is_empty());
}

#[test]
fn redirect_uses_the_owning_document() {
    let other = Document::from_page_texts("other.txt", &["Misc notes", "Seat"]);
    let parts = Document::from_page_texts(
        "parts.txt",
        &[
            "CONTENTS\nFuel filter element . . . . . 2",
            "Primary fuel filter element\nPart No: RE62418",
        ],
    );
    let results = find_parts(&[other, parts], "fuel filter", &SearchConfig::default());

    let redirected = results
        .iter()
        .find(|r| r.is_followed_from_index)
        .expect("redirected result");
    assert_eq!(redirected.document, "parts.txt");
    assert_eq!(redirected.location.page_number, 2);
    assert_eq!(redirected.index_page_number, Some(1));
    assert_eq!(redirected.part_number.as_deref(), Some("RE62418"));
    assert!(results.iter().all(|r| r.document == "parts.txt"));
}

#[test]
fn redirects_can_be_disabled() {
    let config = SearchConfig {
        follow_index: false,
        ..SearchConfig::default()
    };
    let results = find_parts(&[service_manual()], "engine oil filter", &config);
    assert!(results.iter().all(|r| !r.is_followed_from_index && r.resolution.is_none()));
    assert!(results.iter().any(|r| r.location.page_number == 12));
}
