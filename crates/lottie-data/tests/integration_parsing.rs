use lottie_data::model::{LottieJson, Shape, Value};

const REPEATER_DOC: &str = r##"{
    "v": "5.7.4", "fr": 30, "ip": 0, "op": 90, "w": 200, "h": 200,
    "assets": [
        { "id": "comp_0", "layers": [
            { "ty": 1, "ind": 1, "ip": 0, "op": 90, "st": 0, "sc": "#ff8800", "sw": 50, "sh": 50, "ks": {} }
        ] }
    ],
    "layers": [
        { "ty": 0, "ind": 1, "refId": "comp_0", "w": 200, "h": 200, "ip": 0, "op": 90, "st": 0, "ks": {} },
        { "ty": 4, "ind": 2, "parent": 1, "ip": 0, "op": 90, "st": 0,
          "ks": {
            "p": { "a": 1, "k": [
                { "t": 0, "s": [0, 0, 0], "to": [10, 0, 0], "ti": [-10, 0, 0],
                  "o": { "x": 0.33, "y": 0 }, "i": { "x": 0.67, "y": 1 } },
                { "t": 30, "s": [100, 0, 0] }
            ] }
          },
          "shapes": [
            { "ty": "gr", "it": [
                { "ty": "el", "s": { "a": 0, "k": [20, 20] }, "p": { "a": 0, "k": [0, 0] } },
                { "ty": "st", "c": { "a": 0, "k": [0, 0, 0, 1] }, "o": { "a": 0, "k": 100 },
                  "w": { "a": 0, "k": 2 },
                  "d": [ { "n": "d", "v": { "a": 0, "k": 4 } }, { "n": "g", "v": { "a": 0, "k": 2 } } ] },
                { "ty": "rp", "c": { "a": 0, "k": 3 }, "o": { "a": 0, "k": 0 }, "m": 1,
                  "tr": { "p": { "a": 0, "k": [30, 0] }, "so": { "a": 0, "k": 100 }, "eo": { "a": 0, "k": 30 } } },
                { "ty": "tr", "o": { "a": 0, "k": 100 } }
            ] }
          ]
        }
    ]
}"##;

#[test]
fn test_parse_precomp_and_repeater_document() {
    let doc: LottieJson = serde_json::from_str(REPEATER_DOC).expect("document should parse");
    assert_eq!(doc.fr, 30.0);
    assert_eq!(doc.assets.len(), 1);
    assert_eq!(doc.assets[0].layers.as_ref().map(|l| l.len()), Some(1));
    assert_eq!(doc.layers[1].parent, Some(1));

    let shapes = doc.layers[1].shapes.as_ref().expect("shape layer");
    let group = match &shapes[0] {
        Shape::Group(g) => g,
        other => panic!("Expected group, got {:?}", other),
    };
    assert_eq!(group.it.len(), 4);
    match &group.it[1] {
        Shape::Stroke(st) => {
            assert_eq!(st.d.len(), 2);
            assert_eq!(st.lc, 2);
        }
        other => panic!("Expected stroke, got {:?}", other),
    }
    match &group.it[2] {
        Shape::Repeater(rp) => {
            assert_eq!(rp.m, 1);
            assert!(matches!(rp.tr.eo.k, Value::Static(v) if v == 30.0));
        }
        other => panic!("Expected repeater, got {:?}", other),
    }
}

#[test]
fn test_spatial_keyframe_tangents_survive() {
    let doc: LottieJson = serde_json::from_str(REPEATER_DOC).unwrap();
    let ks = &doc.layers[1].ks;
    match &ks.p {
        lottie_data::model::PositionProperty::Unified(p) => match &p.k {
            Value::Animated(kfs) => {
                assert_eq!(kfs[0].to.as_deref(), Some(&[10.0, 0.0, 0.0][..]));
                assert_eq!(kfs[0].o.map(|o| o.x), Some(0.33));
            }
            other => panic!("Expected keyframes, got {:?}", other),
        },
        other => panic!("Expected unified position, got {:?}", other),
    }
}

#[test]
fn test_malformed_document_is_rejected() {
    let res: Result<LottieJson, _> = serde_json::from_str(r#"{ "ip": 0, "op": 10 }"#);
    assert!(res.is_err());
}
