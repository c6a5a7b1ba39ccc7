//! Script runtime tests: programs are built as ASTs and run against a
//! loaded database, with output captured in memory.

use gedbase::interp::context::Context;
use gedbase::interp::output::ScriptOutput;
use gedbase::interp::pnode::{PNode, PNodeKind, Routine};
use gedbase::interp::pvalue::PValue;
use gedbase::interp::{call_procedure, evaluate, interpret};
use gedbase::{string_to_database, Database, ErrorLog};

const FAMILY: &str = "\
0 HEAD
0 @I1@ INDI
1 NAME John /Smith/
1 SEX M
1 FAMS @F1@
0 @I2@ INDI
1 NAME Mary /Jones/
1 SEX F
1 FAMS @F1@
0 @I3@ INDI
1 NAME Ann /Smith/
1 SEX F
1 FAMC @F1@
0 @I4@ INDI
1 NAME Ben /Smith/
1 SEX M
1 FAMC @F1@
0 @F1@ FAM
1 HUSB @I1@
1 WIFE @I2@
1 CHIL @I3@
1 CHIL @I4@
0 TRLR
";

fn family_db() -> Database {
    let mut log = ErrorLog::new();
    string_to_database(FAMILY, "family.ged", &mut log).expect("clean import")
}

fn context() -> Context {
    Context::with_output(family_db(), ScriptOutput::memory("report"))
}

fn output_of(ctx: &mut Context) -> String {
    ctx.output().memory_contents().expect("memory output")
}

// ============================================================================
// Values and arithmetic
// ============================================================================

#[test]
fn test_arithmetic_expression() {
    let mut ctx = context();
    // add(mul(2, 3), 4) = 10
    let expr = PNode::builtin(
        1,
        "add",
        vec![
            PNode::builtin(1, "mul", vec![PNode::int(1, 2), PNode::int(1, 3)]),
            PNode::int(1, 4),
        ],
    );
    let value = evaluate(&mut ctx, &expr).unwrap();
    assert!(matches!(value, PValue::Int(10)));
}

#[test]
fn test_division_by_zero_aborts_with_line() {
    let mut ctx = context();
    let expr = PNode::builtin(7, "div", vec![PNode::int(7, 1), PNode::int(7, 0)]);
    let err = evaluate(&mut ctx, &expr).unwrap_err();
    assert_eq!(err.line, 7);
    assert!(err.message.contains("zero"));
}

#[test]
fn test_type_mismatch_is_an_error() {
    let mut ctx = context();
    let expr = PNode::builtin(
        3,
        "add",
        vec![PNode::string(3, "one"), PNode::int(3, 1)],
    );
    assert!(evaluate(&mut ctx, &expr).is_err());
}

// ============================================================================
// Lists, tables and the scenario from the specification
// ============================================================================

#[test]
fn test_list_push_push_pop() {
    let mut ctx = context();
    let program = PNode::block(
        1,
        vec![
            PNode::builtin(1, "list", vec![PNode::ident(1, "L")]),
            PNode::builtin(2, "push", vec![PNode::ident(2, "L"), PNode::int(2, 1)]),
            PNode::builtin(3, "push", vec![PNode::ident(3, "L"), PNode::int(3, 2)]),
            PNode::builtin(4, "pop", vec![PNode::ident(4, "L")]),
        ],
    );
    interpret(&mut ctx, &program).unwrap();

    let length = evaluate(
        &mut ctx,
        &PNode::builtin(5, "length", vec![PNode::ident(5, "L")]),
    )
    .unwrap();
    assert!(matches!(length, PValue::Int(1)));

    let empty = evaluate(
        &mut ctx,
        &PNode::builtin(6, "empty", vec![PNode::ident(6, "L")]),
    )
    .unwrap();
    assert!(matches!(empty, PValue::Bool(false)));

    let remaining = evaluate(
        &mut ctx,
        &PNode::builtin(7, "getel", vec![PNode::ident(7, "L"), PNode::int(7, 1)]),
    )
    .unwrap();
    assert!(matches!(remaining, PValue::Int(2)));
}

#[test]
fn test_table_insert_and_lookup() {
    let mut ctx = context();
    let program = PNode::block(
        1,
        vec![
            PNode::builtin(1, "table", vec![PNode::ident(1, "T")]),
            PNode::builtin(
                2,
                "insert",
                vec![
                    PNode::ident(2, "T"),
                    PNode::string(2, "answer"),
                    PNode::int(2, 42),
                ],
            ),
        ],
    );
    interpret(&mut ctx, &program).unwrap();

    let hit = evaluate(
        &mut ctx,
        &PNode::builtin(
            3,
            "lookup",
            vec![PNode::ident(3, "T"), PNode::string(3, "answer")],
        ),
    )
    .unwrap();
    assert!(matches!(hit, PValue::Int(42)));

    let miss = evaluate(
        &mut ctx,
        &PNode::builtin(
            4,
            "lookup",
            vec![PNode::ident(4, "T"), PNode::string(4, "question")],
        ),
    )
    .unwrap();
    assert!(matches!(miss, PValue::Null));
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_while_loop_with_break() {
    let mut ctx = context();
    // i = 0; while (1) { i = add(i, 1); if ge(i, 5) break }
    let program = PNode::block(
        1,
        vec![
            PNode::assign(1, "i", PNode::int(1, 0)),
            PNode::while_stmt(
                2,
                PNode::int(2, 1),
                PNode::block(
                    3,
                    vec![
                        PNode::assign(
                            3,
                            "i",
                            PNode::builtin(3, "add", vec![PNode::ident(3, "i"), PNode::int(3, 1)]),
                        ),
                        PNode::if_stmt(
                            4,
                            PNode::builtin(4, "ge", vec![PNode::ident(4, "i"), PNode::int(4, 5)]),
                            PNode::break_stmt(4),
                            None,
                        ),
                    ],
                ),
            ),
        ],
    );
    interpret(&mut ctx, &program).unwrap();
    assert!(matches!(ctx.lookup("i"), Some(PValue::Int(5))));
}

#[test]
fn test_statement_strings_are_written_to_output() {
    let mut ctx = context();
    let program = PNode::block(
        1,
        vec![
            PNode::string(1, "hello"),
            PNode::builtin(1, "sp", vec![]),
            PNode::string(1, "world"),
            PNode::builtin(1, "nl", vec![]),
        ],
    );
    interpret(&mut ctx, &program).unwrap();
    assert_eq!(output_of(&mut ctx), "hello world\n");
}

// ============================================================================
// User routines and frames
// ============================================================================

#[test]
fn test_user_function_with_return() {
    let mut ctx = context();
    // func double(x) { return add(x, x) }
    ctx.define_function(Routine {
        name: "double".to_string(),
        params: vec!["x".to_string()],
        body: PNode::return_stmt(
            2,
            Some(PNode::builtin(
                2,
                "add",
                vec![PNode::ident(2, "x"), PNode::ident(2, "x")],
            )),
        ),
    });
    let value = evaluate(&mut ctx, &PNode::func_call(9, "double", vec![PNode::int(9, 21)])).unwrap();
    assert!(matches!(value, PValue::Int(42)));
}

#[test]
fn test_procedure_locals_do_not_leak() {
    let mut ctx = context();
    ctx.define_procedure(Routine {
        name: "p".to_string(),
        params: vec!["local".to_string()],
        body: PNode::assign(2, "inner", PNode::int(2, 1)),
    });
    call_procedure(&mut ctx, "p", &[PNode::int(1, 5)]).unwrap();
    assert!(ctx.lookup("local").is_none());
    assert!(ctx.lookup("inner").is_none());
    assert_eq!(ctx.frame_depth(), 0);
}

#[test]
fn test_globals_are_visible_and_assignable_in_routines() {
    let mut ctx = context();
    ctx.assign_global("total", PValue::Int(0));
    ctx.define_procedure(Routine {
        name: "bump".to_string(),
        params: vec![],
        body: PNode::assign(
            2,
            "total",
            PNode::builtin(2, "add", vec![PNode::ident(2, "total"), PNode::int(2, 1)]),
        ),
    });
    call_procedure(&mut ctx, "bump", &[]).unwrap();
    call_procedure(&mut ctx, "bump", &[]).unwrap();
    assert!(matches!(ctx.lookup("total"), Some(PValue::Int(2))));
}

#[test]
fn test_undefined_procedure_is_an_error() {
    let mut ctx = context();
    let err = call_procedure(&mut ctx, "nowhere", &[]).unwrap_err();
    assert!(err.message.contains("nowhere"));
}

// ============================================================================
// Lineage loops and accessors
// ============================================================================

#[test]
fn test_forchildren_loop() {
    let mut ctx = context();
    // forchildren(fam("F1"), child, n) { name(child) nl() }
    let body = PNode::block(
        3,
        vec![
            PNode {
                line: 3,
                kind: PNodeKind::BuiltinCall {
                    name: "name".to_string(),
                    args: vec![PNode::ident(3, "child")],
                },
            },
            PNode::builtin(3, "nl", vec![]),
        ],
    );
    let loop_node = PNode {
        line: 2,
        kind: PNodeKind::ForChildren {
            family: Box::new(PNode::builtin(2, "fam", vec![PNode::string(2, "F1")])),
            child: "child".to_string(),
            counter: Some("n".to_string()),
            body: Box::new(body),
        },
    };
    interpret(&mut ctx, &loop_node).unwrap();
    assert_eq!(output_of(&mut ctx), "Ann SMITH\nBen SMITH\n");
    assert!(matches!(ctx.lookup("n"), Some(PValue::Int(2))));
}

#[test]
fn test_lineage_accessors() {
    let mut ctx = context();
    let father = evaluate(
        &mut ctx,
        &PNode::builtin(
            1,
            "father",
            vec![PNode::builtin(1, "indi", vec![PNode::string(1, "I3")])],
        ),
    )
    .unwrap();
    match father {
        PValue::Person(key) => assert_eq!(key, "@I1@"),
        other => panic!("expected person, got {other:?}"),
    }

    let key = evaluate(
        &mut ctx,
        &PNode::builtin(
            2,
            "key",
            vec![PNode::builtin(2, "indi", vec![PNode::string(2, "I1")])],
        ),
    )
    .unwrap();
    match key {
        PValue::String(s) => assert_eq!(s, "I1"),
        other => panic!("expected string, got {other:?}"),
    }

    let sex = evaluate(
        &mut ctx,
        &PNode::builtin(
            3,
            "sex",
            vec![PNode::builtin(3, "indi", vec![PNode::string(3, "I2")])],
        ),
    )
    .unwrap();
    match sex {
        PValue::String(s) => assert_eq!(s, "F"),
        other => panic!("expected string, got {other:?}"),
    }
}

#[test]
fn test_traverse_loop_counts_nodes() {
    let mut ctx = context();
    let body = PNode::builtin(3, "incr", vec![PNode::ident(3, "count")]);
    let program = PNode::block(
        1,
        vec![
            PNode::assign(1, "count", PNode::int(1, 0)),
            PNode {
                line: 2,
                kind: PNodeKind::Traverse {
                    root: Box::new(PNode::builtin(2, "indi", vec![PNode::string(2, "I1")])),
                    node: "node".to_string(),
                    level: "level".to_string(),
                    body: Box::new(body),
                },
            },
        ],
    );
    interpret(&mut ctx, &program).unwrap();
    // @I1@ INDI + NAME + SEX + FAMS = 4 nodes.
    assert!(matches!(ctx.lookup("count"), Some(PValue::Int(4))));
}

// ============================================================================
// Sequences in scripts
// ============================================================================

#[test]
fn test_indiset_builtins() {
    let mut ctx = context();
    let program = PNode::block(
        1,
        vec![
            PNode::builtin(1, "indiset", vec![PNode::ident(1, "s")]),
            PNode::builtin(
                2,
                "addtoset",
                vec![
                    PNode::ident(2, "s"),
                    PNode::builtin(2, "indi", vec![PNode::string(2, "I3")]),
                    PNode::int(2, 1),
                ],
            ),
            PNode::builtin(
                3,
                "addtoset",
                vec![
                    PNode::ident(3, "s"),
                    PNode::builtin(3, "indi", vec![PNode::string(3, "I4")]),
                    PNode::int(3, 2),
                ],
            ),
        ],
    );
    interpret(&mut ctx, &program).unwrap();

    let length = evaluate(
        &mut ctx,
        &PNode::builtin(4, "lengthset", vec![PNode::ident(4, "s")]),
    )
    .unwrap();
    assert!(matches!(length, PValue::Int(2)));

    let inset = evaluate(
        &mut ctx,
        &PNode::builtin(
            5,
            "inset",
            vec![
                PNode::ident(5, "s"),
                PNode::builtin(5, "indi", vec![PNode::string(5, "I3")]),
            ],
        ),
    )
    .unwrap();
    assert!(matches!(inset, PValue::Bool(true)));

    // parentset of the two children is their parents.
    let parents = evaluate(
        &mut ctx,
        &PNode::builtin(6, "parentset", vec![PNode::ident(6, "s")]),
    )
    .unwrap();
    let PValue::Sequence(parents) = parents else {
        panic!("expected a set");
    };
    assert_eq!(parents.borrow().len(), 2);
    assert!(parents.borrow().is_in("@I1@"));
    assert!(parents.borrow().is_in("@I2@"));
}

#[test]
fn test_genindiset_name_query() {
    let mut ctx = context();
    let program = PNode::builtin(
        1,
        "genindiset",
        vec![PNode::string(1, "John /Smith/"), PNode::ident(1, "hits")],
    );
    interpret(&mut ctx, &program).unwrap();
    let PValue::Sequence(hits) = ctx.lookup("hits").cloned().unwrap() else {
        panic!("expected a set");
    };
    let keys: Vec<String> = hits.borrow().keys().map(str::to_string).collect();
    assert_eq!(keys, ["@I1@"]);
}

#[test]
fn test_gengedcom_writes_records() {
    let mut ctx = context();
    let program = PNode::block(
        1,
        vec![
            PNode::builtin(1, "indiset", vec![PNode::ident(1, "s")]),
            PNode::builtin(
                2,
                "addtoset",
                vec![
                    PNode::ident(2, "s"),
                    PNode::builtin(2, "indi", vec![PNode::string(2, "I3")]),
                    PNode::int(2, 0),
                ],
            ),
            PNode::builtin(3, "gengedcom", vec![PNode::ident(3, "s")]),
        ],
    );
    interpret(&mut ctx, &program).unwrap();
    let out = output_of(&mut ctx);
    assert!(out.starts_with("0 @I3@ INDI\n"));
    assert!(out.contains("1 FAMC @F1@"));
}

// ============================================================================
// Page mode output
// ============================================================================

#[test]
fn test_page_mode_report() {
    let mut ctx = context();
    let program = PNode::block(
        1,
        vec![
            PNode::builtin(1, "pagemode", vec![PNode::int(1, 3), PNode::int(1, 20)]),
            PNode::builtin(2, "pos", vec![PNode::int(2, 1), PNode::int(2, 1)]),
            PNode::string(2, "left"),
            PNode::builtin(3, "pos", vec![PNode::int(3, 2), PNode::int(3, 6)]),
            PNode::string(3, "indented"),
            PNode::builtin(4, "pageout", vec![]),
        ],
    );
    interpret(&mut ctx, &program).unwrap();
    assert_eq!(output_of(&mut ctx), "left\n     indented\n\n");
}

// ============================================================================
// Record editing from scripts
// ============================================================================

#[test]
fn test_removechild_builtin_updates_database() {
    let mut ctx = context();
    let program = PNode::builtin(
        1,
        "removechild",
        vec![
            PNode::builtin(1, "fam", vec![PNode::string(1, "F1")]),
            PNode::builtin(1, "indi", vec![PNode::string(1, "I3")]),
        ],
    );
    interpret(&mut ctx, &program).unwrap();

    let database = ctx.into_database();
    let family = database.family("@F1@").unwrap();
    let children: Vec<&str> = gedbase::lineage::child_keys(family).collect();
    assert_eq!(children, ["@I4@"]);
}
