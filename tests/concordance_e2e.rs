use std::cell::RefCell;

use country_converter::{
    AggregationRule, CountryConverter, MissingPolicy, OutputShape, Rules, SparseTable, Value,
};

fn exio_rules() -> Vec<AggregationRule> {
    vec![
        AggregationRule::named("EU"),
        AggregationRule::named("OECD"),
        AggregationRule::named("continent"),
    ]
}

const ORIGINALS: [&str; 5] = ["TW", "XX", "AT", "US", "WA"];

#[test]
fn correspondence_exio1_to_continent() {
    let cc = CountryConverter::new().unwrap();
    let corr = cc.get_correspondance_dict("EXIO1", "continent", true).unwrap();
    assert_eq!(corr.len(), 44);
    assert_eq!(corr["AT"], vec![Value::from("Europe")]);
    assert_eq!(corr["US"], vec![Value::from("America")]);
    assert_eq!(
        corr["WW"],
        vec![
            Value::from("Asia"),
            Value::from("Europe"),
            Value::from("Africa"),
            Value::from("Oceania"),
            Value::from("America"),
            Value::from("Antarctica"),
        ]
    );
}

#[test]
fn correspondence_exio1_to_oecd() {
    let cc = CountryConverter::new().unwrap();

    let labelled = cc.get_correspondance_dict("EXIO1", "OECD", true).unwrap();
    assert_eq!(labelled["AT"], vec![Value::from("OECD")]);
    assert_eq!(labelled["TW"], vec![Value::Null]);
    assert_eq!(labelled["WW"], vec![Value::Null, Value::from("OECD")]);

    let years = cc.get_correspondance_dict("EXIO1", "OECD", false).unwrap();
    assert_eq!(years["AT"], vec![Value::Int(1961)]);
    assert_eq!(years["JP"], vec![Value::Int(1964)]);
    assert_eq!(
        years["WW"],
        vec![Value::Null, Value::Int(2010), Value::Int(1961), Value::Int(1973)]
    );
}

#[test]
fn correspondence_rejects_unknown_scheme() {
    let err = country_converter::get_correspondance_dict("EXIO1", "abc", true).unwrap_err();
    assert!(err.is_unknown_classification());
}

#[test]
fn custom_rules_shapes() {
    let cc = CountryConverter::new().unwrap();
    let originals = vec!["c1", "c2", "c3", "c4"];
    let rules = || -> Rules {
        AggregationRule::map([("c1", "r1"), ("c2", "r1"), ("c3", "r2")]).into()
    };

    let keep = cc.agg_conc(originals.clone(), rules()).build().unwrap();
    assert_eq!(keep.get("c4"), Some("c4"));

    let row = cc
        .agg_conc(originals.clone(), rules())
        .missing("RoW")
        .build()
        .unwrap();
    assert_eq!(row.get("c4"), Some("RoW"));

    let sparse = cc
        .agg_conc(originals.clone(), rules())
        .missing("RoW")
        .shape(OutputShape::Sparse)
        .run()
        .unwrap();
    let sparse = sparse.as_sparse().unwrap();
    assert_eq!(sparse.columns, [SparseTable::ORIGINAL, SparseTable::AGGREGATED]);
    assert_eq!(
        sparse.rows[3],
        ("c4".to_string(), "RoW".to_string())
    );

    let full = cc
        .agg_conc(originals, rules())
        .missing("RoW")
        .shape(OutputShape::Full)
        .run()
        .unwrap();
    let matrix = full.as_matrix().unwrap();
    assert_eq!(matrix.shape(), (4, 3));
    assert_eq!(matrix.columns, vec!["r1", "r2", "RoW"]);
    assert_eq!(matrix.get("c2", "r1"), Some(1.0));
    assert_eq!(matrix.get("c2", "r2"), Some(0.0));
    assert_eq!(matrix.get("c4", "RoW"), Some(1.0));
}

#[test]
fn exio_rules_keep_missing() {
    let cc = CountryConverter::new().unwrap();
    let conc = cc
        .agg_conc(ORIGINALS, exio_rules())
        .first_match_only()
        .build()
        .unwrap();
    let pairs: Vec<(&str, &str)> = conc.iter().collect();
    assert_eq!(
        pairs,
        vec![
            ("TW", "Asia"),
            ("XX", "XX"),
            ("AT", "EU"),
            ("US", "OECD"),
            ("WA", "WA"),
        ]
    );
}

#[test]
fn exio_rules_replace_and_drop() {
    let cc = CountryConverter::new().unwrap();
    let replaced = cc
        .agg_conc(ORIGINALS, exio_rules())
        .first_match_only()
        .missing("RoW")
        .build()
        .unwrap();
    assert_eq!(replaced.get("XX"), Some("RoW"));
    assert_eq!(replaced.get("WA"), Some("RoW"));
    assert_eq!(replaced.get("TW"), Some("Asia"));

    let dropped = cc
        .agg_conc(ORIGINALS, exio_rules())
        .first_match_only()
        .missing(MissingPolicy::Drop)
        .build()
        .unwrap();
    let keys: Vec<&str> = dropped.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["TW", "AT", "US"]);

    let full = cc
        .agg_conc(ORIGINALS, exio_rules())
        .first_match_only()
        .missing(false)
        .shape(OutputShape::Full)
        .run()
        .unwrap();
    let matrix = full.as_matrix().unwrap();
    assert_eq!(matrix.index, vec!["TW", "AT", "US"]);
    assert_eq!(matrix.columns, vec!["Asia", "EU", "OECD"]);
}

#[test]
fn rule_order_decides() {
    let cc = CountryConverter::new().unwrap();
    let conc = cc
        .agg_conc(
            ORIGINALS,
            vec![
                AggregationRule::named("OECD"),
                AggregationRule::map([("WA", "RoW"), ("WF", "RoW")]),
            ],
        )
        .first_match_only()
        .build()
        .unwrap();
    let pairs: Vec<(&str, &str)> = conc.iter().collect();
    assert_eq!(
        pairs,
        vec![
            ("TW", "TW"),
            ("XX", "XX"),
            ("AT", "OECD"),
            ("US", "OECD"),
            ("WA", "RoW"),
        ]
    );
}

#[test]
fn classification_originals_cover_every_code() {
    let conc = country_converter::agg_conc("EXIO2", "EU")
        .unwrap()
        .first_match_only()
        .missing("RoW")
        .build()
        .unwrap();
    assert_eq!(conc.len(), 48);
    assert_eq!(conc.get("US"), Some("RoW"));
    assert_eq!(conc.get("AT"), Some("EU"));
}

#[test]
fn callbacks_report_missing_entities() {
    let cc = CountryConverter::new().unwrap();
    let missing = RefCell::new(Vec::new());
    let conc = cc
        .agg_conc(ORIGINALS, exio_rules())
        .first_match_only()
        .missing("RoW")
        .on_missing(|e| missing.borrow_mut().push(e.to_string()))
        .build()
        .unwrap();
    assert_eq!(conc.len(), 5);
    assert_eq!(missing.into_inner(), vec!["XX", "WA"]);
}

#[test]
fn merged_labels_for_grouped_codes() {
    let cc = CountryConverter::new().unwrap();
    let mut merged = Vec::new();
    let conc = cc
        .agg_conc(["WW", "AT"], "continent")
        .original_class("EXIO1")
        .on_merge_multiple(|e| merged.push(e.to_string()))
        .build()
        .unwrap();
    assert_eq!(
        conc.get("WW"),
        Some("Asia_&_Europe_&_Africa_&_Oceania_&_America_&_Antarctica")
    );
    assert_eq!(conc.get("AT"), Some("Europe"));
    assert_eq!(merged, vec!["WW"]);
}

#[test]
fn unknown_rule_is_an_error() {
    let cc = CountryConverter::new().unwrap();
    let err = cc.agg_conc(ORIGINALS, "abc").build().unwrap_err();
    assert!(err.is_unknown_classification());
}

#[test]
fn names_match_across_lists() {
    let matched = country_converter::match_names(
        ["norway", "united_states", "china", "taiwan", "abc"],
        [
            "USA",
            "The Swedish Kingdom",
            "Norway is a Kingdom too",
            "Peoples Republic of China",
            "Republic of China",
        ],
    )
    .unwrap();
    assert_eq!(matched["china"], "Peoples Republic of China");
    assert_eq!(matched["taiwan"], "Republic of China");
    assert_eq!(matched["united_states"], "USA");
    assert_eq!(matched["norway"], "Norway is a Kingdom too");
    assert_eq!(matched["abc"], country_converter::MATCH_NOT_FOUND);
}
