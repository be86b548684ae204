use super::*;
use crate::model::TreeNode;

fn house_price_model() -> ModelDescriptor {
    ModelDescriptor::Linear {
        intercept: 50000.0,
        coefficients: vec![200.0, 15000.0, 10000.0],
    }
}

/// Root splits on feature 0 at 0.0: left leaf is class 1, right leaf class 0.
fn stump() -> ModelDescriptor {
    ModelDescriptor::Tree {
        nodes: vec![
            TreeNode::split(0, 0.0, 1, 2),
            TreeNode::leaf(vec![0.0, 1.0]),
            TreeNode::leaf(vec![1.0, 0.0]),
        ],
    }
}

// --- Linear ---

#[test]
fn test_linear_source() {
    let source = generate(&house_price_model()).unwrap();
    assert_eq!(source.family, ModelFamily::Linear);
    assert_eq!(source.n_features, 3);
    assert_eq!(source.file_name, "linear_model.c");
    insta::assert_snapshot!(source.code, @r###"
/* Generated by modelc: LinearRegression, 3 features. */
/* Parameters are narrowed to single precision. */

float predict(const float *x) {
    static const float coefficients[3] = {200.0f, 15000.0f, 10000.0f};
    float result = 50000.0f;
    for (int i = 0; i < 3; i++) {
        result += coefficients[i] * x[i];
    }
    return result;
}
"###);
}

#[test]
fn test_linear_narrows_parameters() {
    let source = generate(&ModelDescriptor::Linear {
        intercept: 0.1,
        coefficients: vec![1.0 / 3.0],
    })
    .unwrap();
    assert!(source.code.contains("{0.33333334f}"), "{}", source.code);
    assert!(source.code.contains("float result = 0.1f;"));
}

#[test]
fn test_linear_empty_coefficients() {
    let err = generate(&ModelDescriptor::Linear {
        intercept: 1.0,
        coefficients: vec![],
    })
    .unwrap_err();
    assert!(matches!(err, Error::EmptyCoefficients));
}

#[test]
fn test_linear_unrepresentable_coefficient() {
    let err = generate(&ModelDescriptor::Linear {
        intercept: 1.0,
        coefficients: vec![1.0, 1e39],
    })
    .unwrap_err();
    assert!(matches!(err, Error::MalformedParameters(_)));
}

// --- Logistic ---

#[test]
fn test_logistic_source() {
    let source = generate(&ModelDescriptor::Logistic {
        intercept: -1.5,
        coefficients: vec![0.25, -2.0],
    })
    .unwrap();
    assert_eq!(source.file_name, "logistic_model.c");
    insta::assert_snapshot!(source.code, @r###"
/* Generated by modelc: LogisticRegression, 2 features. */
/* Parameters are narrowed to single precision. */

#include <math.h>

float sigmoid(float z) {
    return 1.0f / (1.0f + expf(-z));
}

float decision_function(const float *x) {
    static const float coefficients[2] = {0.25f, -2.0f};
    float z = -1.5f;
    for (int i = 0; i < 2; i++) {
        z += coefficients[i] * x[i];
    }
    return z;
}

int predict(const float *x) {
    return sigmoid(decision_function(x)) >= 0.5f ? 1 : 0;
}
"###);
}

#[test]
fn test_logistic_boundary_is_inclusive() {
    let source = generate(&ModelDescriptor::Logistic {
        intercept: 0.0,
        coefficients: vec![1.0],
    })
    .unwrap();
    assert!(source.code.contains(">= 0.5f ? 1 : 0"));
    assert!(!source.code.contains("> 0.5f"));
}

#[test]
fn test_logistic_empty_coefficients() {
    let err = generate(&ModelDescriptor::Logistic {
        intercept: 0.0,
        coefficients: vec![],
    })
    .unwrap_err();
    assert!(matches!(err, Error::EmptyCoefficients));
}

// --- Tree ---

#[test]
fn test_tree_stump_source() {
    let source = generate(&stump()).unwrap();
    assert_eq!(source.file_name, "tree_model.c");
    assert_eq!(source.n_features, 1);
    insta::assert_snapshot!(source.code, @r###"
/* Generated by modelc: DecisionTreeClassifier, 3 nodes, 2 leaves, depth 1. */
/* Thresholds are narrowed to single precision. */

int predict(const float *features) {
    if (features[0] <= 0.0f) {
        return 1;
    } else {
        return 0;
    }
}
"###);
}

#[test]
fn test_tree_single_leaf() {
    let source = generate(&ModelDescriptor::Tree {
        nodes: vec![TreeNode::leaf(vec![3.0, 5.0, 5.0])],
    })
    .unwrap();
    assert_eq!(source.n_features, 0);
    // Ties go to the lowest class index.
    assert!(source.code.contains("    return 1;\n"));
    assert!(!source.code.contains("if ("));
}

#[test]
fn test_tree_nesting_mirrors_structure() {
    // depth 2: root on x1, left child on x0, right leaf.
    let nodes = vec![
        TreeNode::split(1, 2.5, 1, 4),
        TreeNode::split(0, -0.5, 2, 3),
        TreeNode::leaf(vec![4.0, 0.0]),
        TreeNode::leaf(vec![0.0, 2.0]),
        TreeNode::leaf(vec![1.0, 1.0]),
    ];
    let code = generate(&ModelDescriptor::Tree { nodes }).unwrap().code;
    let body: Vec<&str> = code
        .lines()
        .skip_while(|l| !l.starts_with("int predict"))
        .collect();
    assert_eq!(
        body,
        vec![
            "int predict(const float *features) {",
            "    if (features[1] <= 2.5f) {",
            "        if (features[0] <= -0.5f) {",
            "            return 0;",
            "        } else {",
            "            return 1;",
            "        }",
            "    } else {",
            "        return 0;",
            "    }",
            "}",
        ]
    );
    assert!(code.contains("5 nodes, 3 leaves, depth 2"));
}

#[test]
fn test_tree_threshold_rounds_toward_left_branch() {
    let nodes = vec![
        TreeNode::split(0, 0.1, 1, 2),
        TreeNode::leaf(vec![0.0, 3.0]),
        TreeNode::leaf(vec![3.0, 0.0]),
    ];
    let code = generate(&ModelDescriptor::Tree { nodes }).unwrap().code;
    // 0.1f would send the input 0.1f (just above 0.1) to the left.
    assert!(code.contains("if (features[0] <= 0.099999994f) {"), "{}", code);
    assert!(!code.contains("<= 0.1f"));
}

#[test]
fn test_tree_child_out_of_range() {
    let err = generate(&ModelDescriptor::Tree {
        nodes: vec![
            TreeNode::split(0, 0.0, 1, 7),
            TreeNode::leaf(vec![1.0]),
        ],
    })
    .unwrap_err();
    match err {
        Error::MalformedTree(msg) => assert!(msg.contains("child 7"), "{}", msg),
        other => panic!("expected MalformedTree, got {:?}", other),
    }
}

#[test]
fn test_tree_cycle_does_not_hang() {
    let err = generate(&ModelDescriptor::Tree {
        nodes: vec![
            TreeNode::split(0, 0.0, 1, 2),
            TreeNode::split(1, 0.0, 0, 2),
            TreeNode::leaf(vec![1.0]),
        ],
    })
    .unwrap_err();
    assert!(matches!(err, Error::MalformedTree(_)));
}

#[test]
fn test_tree_self_loop_and_shared_subtree() {
    let self_loop = vec![TreeNode::split(0, 0.0, 0, 0)];
    assert!(matches!(
        generate(&ModelDescriptor::Tree { nodes: self_loop }),
        Err(Error::MalformedTree(_))
    ));

    let shared = vec![
        TreeNode::split(0, 0.0, 1, 1),
        TreeNode::leaf(vec![1.0]),
    ];
    assert!(matches!(
        generate(&ModelDescriptor::Tree { nodes: shared }),
        Err(Error::MalformedTree(_))
    ));
}

#[test]
fn test_tree_empty_and_countless_leaf() {
    assert!(matches!(
        generate(&ModelDescriptor::Tree { nodes: vec![] }),
        Err(Error::MalformedTree(_))
    ));
    assert!(matches!(
        generate(&ModelDescriptor::Tree {
            nodes: vec![TreeNode::leaf(vec![])]
        }),
        Err(Error::MalformedTree(_))
    ));
}

#[test]
fn test_tree_shape_counts_reachable_nodes() {
    let nodes = vec![
        TreeNode::split(0, 0.0, 1, 2),
        TreeNode::leaf(vec![1.0]),
        TreeNode::leaf(vec![1.0]),
        TreeNode::leaf(vec![1.0]), // orphan
    ];
    let shape = tree_shape(&nodes).unwrap();
    assert_eq!(
        shape,
        TreeShape {
            nodes: 3,
            leaves: 2,
            depth: 1
        }
    );
}

// --- Determinism ---

#[test]
fn test_generation_is_deterministic() {
    for descriptor in [house_price_model(), stump()] {
        let a = generate(&descriptor).unwrap();
        let b = generate(&descriptor).unwrap();
        assert_eq!(a.code, b.code);
        assert_eq!(a.content_hash(), b.content_hash());
    }
    let a = generate(&house_price_model()).unwrap();
    let b = generate(&stump()).unwrap();
    assert_ne!(a.content_hash(), b.content_hash());
}

#[test]
fn test_write_to() {
    let dir = tempfile::tempdir().unwrap();
    let source = generate(&stump()).unwrap();
    let path = source.write_to(dir.path()).unwrap();
    assert_eq!(path, dir.path().join("tree_model.c"));
    assert_eq!(std::fs::read_to_string(path).unwrap(), source.code);
}
