use gdx_model::{
    is_na, Domain, LabelUniverse, MemoryContainer, MemorySymbol, Record, RecordSource,
    SourceError, SpecialValue, SymbolEntry, SymbolHandle, SymbolKind, ValueFacet,
};
use gdx_read::{
    extract, extract_json, ErrorKind, Extraction, FieldSelection, Form, ReadError, ReadOptions,
    ReadSpec, SymbolReport,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn container() -> MemoryContainer {
    MemoryContainer::builder()
        .labels(["a", "b", "c"])
        .text("first")
        .symbol(
            MemorySymbol::set("i", 1)
                .with_text("the i set")
                .element(&["a"])
                .element(&["b"])
                .element(&["c"]),
        )
        .symbol(
            MemorySymbol::parameter("x", 1)
                .with_domain(["i"])
                .with_text("a parameter")
                .level(&["a"], 1.0)
                .level(&["b"], 0.0)
                .level(&["c"], 3.0),
        )
        .symbol(
            MemorySymbol::set("s", 2)
                .element(&["a", "b"])
                .element_with_text(&["a", "c"], 1),
        )
        .symbol(
            MemorySymbol::parameter("y", 2)
                .level(&["a", "c"], 1.0)
                .level(&["c", "c"], 2.0),
        )
        .symbol(
            MemorySymbol::variable("v", 1)
                .with_domain(["i"])
                .record(&["a"], [1.0, 2.0, 0.0, 5.0, 1.0])
                .record(&["c"], [0.0, 4.0, 0.0, 9.0, 1.0]),
        )
        .symbol(MemorySymbol::parameter("z", 0).level(&[], 7.0))
        .alias("ii", "i")
        .alias("xx", "x")
        .build()
        .unwrap()
}

fn read(spec: ReadSpec) -> SymbolReport {
    read_with(spec, ReadOptions::default())
}

fn read_with(spec: ReadSpec, options: ReadOptions) -> SymbolReport {
    let mut container = container();
    match extract(&mut container, Some(&spec), &options).unwrap() {
        Extraction::Symbol(report) => report,
        Extraction::Universe(_) => panic!("expected a symbol report"),
    }
}

fn read_err(spec: ReadSpec) -> ReadError {
    let mut container = container();
    extract(&mut container, Some(&spec), &ReadOptions::default()).unwrap_err()
}

fn labels(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|l| (*l).to_owned()).collect()
}

fn sparse_rows(report: &SymbolReport) -> Vec<Vec<f64>> {
    report.val.as_sparse().unwrap().to_matrix()
}

#[test]
fn zero_records_are_squeezed_from_sparse_output() {
    let report = read(ReadSpec::builder("x").build().unwrap());
    assert_eq!(report.name, "x");
    assert_eq!(report.kind, SymbolKind::Parameter);
    assert_eq!(report.dim, 1);
    assert_eq!(sparse_rows(&report), vec![vec![1.0, 1.0], vec![3.0, 3.0]]);
    assert_eq!(report.uels, vec![labels(&["a", "b", "c"])]);
    assert_eq!(report.domains, vec!["i".to_owned()]);
    assert_eq!(report.field, None);
    assert_eq!(report.ts, None);
    assert!(report.te.is_none());
}

#[test]
fn squeeze_can_be_switched_off() {
    let options = ReadOptions {
        squeeze: false,
        ..ReadOptions::default()
    };
    let report = read_with(ReadSpec::builder("x").build().unwrap(), options);
    assert_eq!(
        sparse_rows(&report),
        vec![vec![1.0, 1.0], vec![2.0, 0.0], vec![3.0, 3.0]]
    );
}

#[test]
fn full_form_scatters_into_column_major_array() {
    let report = read(ReadSpec::builder("x").form(Form::Full).build().unwrap());
    let dense = report.val.as_full().unwrap();
    assert_eq!(dense.shape(), &[3, 1]);
    assert_eq!(dense.data(), &[1.0, 0.0, 3.0]);
    assert_eq!(report.form, Form::Full);
    assert_eq!(report.uels, vec![labels(&["a", "b", "c"])]);
}

#[test]
fn two_dimensional_sets_report_element_text() {
    let report = read(ReadSpec::builder("s").text(true).build().unwrap());
    assert_eq!(sparse_rows(&report), vec![vec![1.0, 2.0], vec![1.0, 3.0]]);
    let texts = report.te.as_ref().unwrap().as_sparse().unwrap();
    assert_eq!(texts, &labels(&["a.b", "first"])[..]);
    assert_eq!(report.domains, vec!["*".to_owned(), "*".to_owned()]);
}

#[test]
fn dense_sets_mark_present_elements() {
    let report = read(
        ReadSpec::builder("s")
            .form(Form::Full)
            .text(true)
            .build()
            .unwrap(),
    );
    let dense = report.val.as_full().unwrap();
    assert_eq!(dense.shape(), &[3, 3]);
    assert_eq!(
        dense.data(),
        &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0]
    );

    let texts = report.te.as_ref().unwrap().as_full().unwrap();
    assert_eq!(texts.get(&[1, 2]).map(String::as_str), Some("a.b"));
    assert_eq!(texts.get(&[1, 3]).map(String::as_str), Some("first"));
    assert_eq!(texts.get(&[2, 2]).map(String::as_str), Some(""));
}

#[test]
fn explicit_filters_renumber_positions_by_list_order() {
    let report = read(
        ReadSpec::builder("x")
            .filters([["a", "c"]])
            .build()
            .unwrap(),
    );
    assert_eq!(sparse_rows(&report), vec![vec![1.0, 1.0], vec![2.0, 3.0]]);
    assert_eq!(report.uels, vec![labels(&["a", "c"])]);
    assert_eq!(report.domains, vec!["_user".to_owned()]);
}

#[test]
fn filter_order_decides_positions() {
    let report = read(
        ReadSpec::builder("x")
            .filters([["c", "a"]])
            .build()
            .unwrap(),
    );
    assert_eq!(sparse_rows(&report), vec![vec![2.0, 1.0], vec![1.0, 3.0]]);
}

#[test]
fn filters_with_unknown_labels_match_nothing_for_that_label() {
    let report = read(
        ReadSpec::builder("x")
            .filters([["nope", "c"]])
            .build()
            .unwrap(),
    );
    assert_eq!(sparse_rows(&report), vec![vec![2.0, 3.0]]);
    assert_eq!(report.uels, vec![labels(&["nope", "c"])]);
}

#[test]
fn filtered_reads_keep_zero_matches() {
    let single = read(ReadSpec::builder("x").filters([["b"]]).build().unwrap());
    assert_eq!(sparse_rows(&single), vec![vec![1.0, 0.0]]);

    let all = read(
        ReadSpec::builder("x")
            .filters([["a", "b", "c"]])
            .build()
            .unwrap(),
    );
    assert_eq!(
        sparse_rows(&all),
        vec![vec![1.0, 1.0], vec![2.0, 0.0], vec![3.0, 3.0]]
    );
}

#[test]
fn filtered_full_form_uses_filter_cardinality() {
    let report = read(
        ReadSpec::builder("y")
            .form(Form::Full)
            .filters([vec!["c", "a"], vec!["c"]])
            .build()
            .unwrap(),
    );
    let dense = report.val.as_full().unwrap();
    assert_eq!(dense.shape(), &[2, 1]);
    assert_eq!(dense.data(), &[2.0, 1.0]);
}

#[test]
fn compress_keeps_only_used_labels() {
    let report = read(ReadSpec::builder("y").compress(true).build().unwrap());
    assert_eq!(report.uels, vec![labels(&["a", "c"]), labels(&["c"])]);
    assert_eq!(
        report.domains,
        vec!["_compressed".to_owned(), "_compressed".to_owned()]
    );
    assert_eq!(
        sparse_rows(&report),
        vec![vec![1.0, 1.0, 1.0], vec![2.0, 1.0, 2.0]]
    );
}

#[test]
fn compressed_full_form_shrinks_the_array() {
    let report = read(
        ReadSpec::builder("y")
            .compress(true)
            .form(Form::Full)
            .build()
            .unwrap(),
    );
    let dense = report.val.as_full().unwrap();
    assert_eq!(dense.shape(), &[2, 1]);
    assert_eq!(dense.data(), &[1.0, 2.0]);
}

#[test]
fn variable_facet_selection() {
    let report = read(
        ReadSpec::builder("v")
            .field(FieldSelection::One(ValueFacet::Upper))
            .build()
            .unwrap(),
    );
    assert_eq!(sparse_rows(&report), vec![vec![1.0, 5.0], vec![3.0, 9.0]]);
    assert_eq!(report.field, Some(FieldSelection::One(ValueFacet::Upper)));

    let levels = read(ReadSpec::builder("v").build().unwrap());
    assert_eq!(sparse_rows(&levels), vec![vec![1.0, 1.0]]);
    assert_eq!(levels.field, Some(FieldSelection::default()));
}

#[test]
fn field_all_adds_a_facet_axis() {
    let report = read(
        ReadSpec::builder("v")
            .field(FieldSelection::All)
            .build()
            .unwrap(),
    );
    assert_eq!(
        sparse_rows(&report),
        vec![
            vec![1.0, 1.0, 1.0],
            vec![1.0, 2.0, 2.0],
            vec![1.0, 3.0, 0.0],
            vec![1.0, 4.0, 5.0],
            vec![1.0, 5.0, 1.0],
            vec![3.0, 1.0, 0.0],
            vec![3.0, 2.0, 4.0],
            vec![3.0, 3.0, 0.0],
            vec![3.0, 4.0, 9.0],
            vec![3.0, 5.0, 1.0],
        ]
    );
    assert_eq!(
        report.uels,
        vec![labels(&["a", "b", "c"]), labels(&["l", "m", "lo", "up", "s"])]
    );
    assert_eq!(report.domains, vec!["i".to_owned(), "_field".to_owned()]);
    assert_eq!(report.field, Some(FieldSelection::All));
}

#[test]
fn field_all_full_form_has_one_column_per_facet() {
    let report = read(
        ReadSpec::builder("v")
            .field(FieldSelection::All)
            .form(Form::Full)
            .build()
            .unwrap(),
    );
    let dense = report.val.as_full().unwrap();
    assert_eq!(dense.shape(), &[3, 5]);
    assert_eq!(dense.get(&[3, 4]), Some(&9.0));
    assert_eq!(dense.get(&[2, 4]), Some(&0.0));
}

#[test]
fn scalars_have_no_positions() {
    let report = read(ReadSpec::builder("z").build().unwrap());
    assert_eq!(sparse_rows(&report), vec![vec![7.0]]);
    assert!(report.uels.is_empty());

    let full = read(ReadSpec::builder("z").form(Form::Full).build().unwrap());
    let dense = full.val.as_full().unwrap();
    assert!(dense.shape().is_empty());
    assert_eq!(dense.data(), &[7.0]);
}

#[test]
fn domain_info_can_be_ignored() {
    let options = ReadOptions {
        use_domain_info: false,
        ..ReadOptions::default()
    };
    let report = read_with(ReadSpec::builder("x").build().unwrap(), options);
    assert_eq!(report.domains, vec!["*".to_owned()]);
    assert_eq!(report.uels, vec![labels(&["a", "b", "c"])]);
}

#[test]
fn domain_axes_follow_set_order() {
    let mut container = MemoryContainer::builder()
        .labels(["a", "b", "c"])
        .symbol(MemorySymbol::set("k", 1).element(&["c"]).element(&["a"]))
        .symbol(
            MemorySymbol::parameter("p", 1)
                .with_domain(["k"])
                .level(&["a"], 1.0)
                .level(&["c"], 2.0),
        )
        .build()
        .unwrap();
    let spec = ReadSpec::builder("p").build().unwrap();
    let report = extract(&mut container, Some(&spec), &ReadOptions::default()).unwrap();
    let report = report.as_symbol().unwrap();
    assert_eq!(report.uels, vec![labels(&["c", "a"])]);
    assert_eq!(report.domains, vec!["k".to_owned()]);
    assert_eq!(sparse_rows(report), vec![vec![2.0, 1.0], vec![1.0, 2.0]]);
}

#[test]
fn keys_outside_the_declared_domain_are_an_io_error() {
    let mut container = MemoryContainer::builder()
        .labels(["a", "b"])
        .symbol(MemorySymbol::set("k", 1).element(&["a"]))
        .symbol(
            MemorySymbol::parameter("p", 1)
                .with_domain(["k"])
                .level(&["b"], 1.0),
        )
        .build()
        .unwrap();
    let spec = ReadSpec::builder("p").build().unwrap();
    let err = extract(&mut container, Some(&spec), &ReadOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(!container.has_open_symbol());

    let again = ReadSpec::builder("k").build().unwrap();
    assert!(extract(&mut container, Some(&again), &ReadOptions::default()).is_ok());
}

/// Delegates to a [`MemoryContainer`] but has no associated texts.
struct TextlessSource(MemoryContainer);

impl RecordSource for TextlessSource {
    fn load_universe(&self) -> Result<LabelUniverse, SourceError> {
        self.0.load_universe()
    }

    fn find_symbol(&self, name: &str) -> Result<SymbolEntry, SourceError> {
        self.0.find_symbol(name)
    }

    fn open_symbol(&mut self, name: &str) -> Result<SymbolHandle, SourceError> {
        self.0.open_symbol(name)
    }

    fn restart(&mut self, handle: &SymbolHandle) -> Result<usize, SourceError> {
        self.0.restart(handle)
    }

    fn next_record(
        &mut self,
        handle: &SymbolHandle,
        out: &mut Record,
    ) -> Result<bool, SourceError> {
        self.0.next_record(handle, out)
    }

    fn close_symbol(&mut self, handle: &SymbolHandle) -> Result<(), SourceError> {
        self.0.close_symbol(handle)
    }

    fn associated_text(&self, index: u32) -> Result<String, SourceError> {
        Err(SourceError::TextIndex { index, len: 0 })
    }

    fn domain_labels(
        &self,
        handle: &SymbolHandle,
        dimension: usize,
    ) -> Result<Option<Domain>, SourceError> {
        self.0.domain_labels(handle, dimension)
    }
}

#[test]
fn text_lookup_failures_release_the_symbol() {
    let filtered = ReadSpec::builder("s")
        .filters([vec!["a"], vec!["b", "c"]])
        .text(true)
        .build()
        .unwrap();
    let unfiltered = ReadSpec::builder("s").text(true).build().unwrap();

    for spec in [filtered, unfiltered] {
        let mut source = TextlessSource(container());
        let err = extract(&mut source, Some(&spec), &ReadOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(!source.0.has_open_symbol());

        let again = ReadSpec::builder("s").build().unwrap();
        assert!(extract(&mut source, Some(&again), &ReadOptions::default()).is_ok());
    }
}

#[test]
fn special_values_map_to_floats() {
    let mut container = MemoryContainer::builder()
        .labels(["a", "b", "c", "d", "e"])
        .symbol(
            MemorySymbol::parameter("w", 1)
                .level(&["a"], SpecialValue::Undef.to_f64())
                .level(&["b"], SpecialValue::Na.to_f64())
                .level(&["c"], SpecialValue::PosInf.to_f64())
                .level(&["d"], SpecialValue::NegInf.to_f64())
                .level(&["e"], SpecialValue::Eps.to_f64()),
        )
        .build()
        .unwrap();
    let spec = ReadSpec::builder("w").build().unwrap();
    let report = extract(&mut container, Some(&spec), &ReadOptions::default()).unwrap();
    let sparse = report.as_symbol().unwrap().val.as_sparse().unwrap();

    // EPS collapses onto zero and is squeezed away.
    assert_eq!(sparse.rows(), 4);
    let values: Vec<f64> = sparse.iter().filter_map(|(_, v)| v).collect();
    assert!(values[0].is_nan() && !is_na(values[0]));
    assert!(is_na(values[1]));
    assert_eq!(values[2], f64::INFINITY);
    assert_eq!(values[3], f64::NEG_INFINITY);
}

#[test]
fn aliases_resolve_to_their_set() {
    let report = read(ReadSpec::builder("II").build().unwrap());
    assert_eq!(report.name, "i");
    assert_eq!(report.kind, SymbolKind::Set);
    assert_eq!(sparse_rows(&report), vec![vec![1.0], vec![2.0], vec![3.0]]);
}

#[test]
fn symbol_lookup_ignores_case() {
    let report = read(ReadSpec::builder("X").build().unwrap());
    assert_eq!(report.name, "x");
}

#[test]
fn aliases_of_non_sets_are_not_found() {
    let err = read_err(ReadSpec::builder("xx").build().unwrap());
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn alias_cycles_are_not_found() {
    let mut container = MemoryContainer::builder()
        .alias("p", "q")
        .alias("q", "p")
        .build()
        .unwrap();
    let spec = ReadSpec::builder("p").build().unwrap();
    let err = extract(&mut container, Some(&spec), &ReadOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn missing_symbols_are_not_found() {
    let err = read_err(ReadSpec::builder("nope").build().unwrap());
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn explanatory_text_is_reported_when_requested() {
    let report = read(
        ReadSpec::builder("x")
            .explanatory_text(true)
            .build()
            .unwrap(),
    );
    assert_eq!(report.ts.as_deref(), Some("a parameter"));

    let empty = read(
        ReadSpec::builder("s")
            .explanatory_text(true)
            .build()
            .unwrap(),
    );
    assert_eq!(empty.ts.as_deref(), Some(""));
}

#[test]
fn symbol_dependent_combinations_are_rejected() {
    let cases = [
        (
            ReadSpec::builder("i")
                .field(FieldSelection::One(ValueFacet::Marginal))
                .build()
                .unwrap(),
            ErrorKind::UnsupportedCombination,
            "field",
        ),
        (
            ReadSpec::builder("x").text(true).build().unwrap(),
            ErrorKind::UnsupportedCombination,
            "te",
        ),
        (
            ReadSpec::builder("x").dim(2).build().unwrap(),
            ErrorKind::UnsupportedCombination,
            "dim",
        ),
        (
            ReadSpec::builder("y").filters([["a"]]).build().unwrap(),
            ErrorKind::Validation,
            "uels",
        ),
    ];
    for (spec, kind, field) in cases {
        let err = read_err(spec);
        assert_eq!(err.kind(), kind, "{err}");
        assert_eq!(err.field(), Some(field), "{err}");
    }
}

#[test]
fn matching_dim_is_accepted() {
    let report = read(ReadSpec::builder("y").dim(2).build().unwrap());
    assert_eq!(report.dim, 2);
}

#[test]
fn no_request_reports_the_universe() {
    let mut container = container();
    let report = extract(&mut container, None, &ReadOptions::default()).unwrap();
    let universe = report.as_universe().unwrap();
    assert_eq!(universe.uels, labels(&["a", "b", "c"]));
    assert_eq!(
        report.to_json().unwrap(),
        json!({
            "name": "*",
            "type": "set",
            "dim": 1,
            "val": null,
            "form": null,
            "uels": ["a", "b", "c"],
        })
    );
}

#[test]
fn json_requests_produce_json_reports() {
    let mut container = container();
    let request = json!({"name": "x", "uels": [["a", "c"]], "ts": "TRUE"});
    let report = extract_json(&mut container, Some(&request), &ReadOptions::default()).unwrap();
    assert_eq!(
        report.to_json().unwrap(),
        json!({
            "name": "x",
            "type": "parameter",
            "dim": 1,
            "val": [[1.0, 1.0], [2.0, 3.0]],
            "form": "sparse",
            "uels": [["a", "c"]],
            "domains": ["_user"],
            "ts": "a parameter",
        })
    );

    let null = extract_json(&mut container, Some(&json!(null)), &ReadOptions::default()).unwrap();
    assert!(null.as_universe().is_some());
}

#[test]
fn json_reports_for_variables_carry_the_field() {
    let mut container = container();
    let request = json!({"name": "v", "field": "M", "form": "full"});
    let report = extract_json(&mut container, Some(&request), &ReadOptions::default()).unwrap();
    assert_eq!(
        report.to_json().unwrap(),
        json!({
            "name": "v",
            "type": "variable",
            "dim": 1,
            "val": {"shape": [3, 1], "data": [2.0, 0.0, 4.0]},
            "form": "full",
            "uels": [["a", "b", "c"]],
            "domains": ["i"],
            "field": "m",
        })
    );
}

#[test]
fn nan_values_serialize_as_null() {
    let mut container = MemoryContainer::builder()
        .symbol(MemorySymbol::parameter("u", 1).level(&["a"], f64::NAN))
        .build()
        .unwrap();
    let request = json!({"name": "u"});
    let report = extract_json(&mut container, Some(&request), &ReadOptions::default()).unwrap();
    assert_eq!(report.to_json().unwrap()["val"], json!([[1.0, null]]));
}
