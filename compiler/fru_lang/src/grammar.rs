//! The Frugurt grammar.
//!
//! Rule names are the node kinds that appear in trees. Hidden rules
//! (`_statement`, `_expression`, ...) group alternatives and never show up
//! as nodes of their own. Fields name the parts of each construct
//! (`condition`, `body`, `left`/`operator`/`right`, ...) so tools can reach
//! them with [`fru_syntax::SyntaxNode::child_by_field_name`].

use fru_grammar::{
    choice, field, lit, optional, prec_left, repeat, sep_by, seq, sym, GrammarBuilder, RuleExpr,
    TokenPattern,
};

/// Binary operators with their precedence, loosest first. User-defined
/// operators bind tightest.
const BINARY_OPERATORS: &[(i32, &str)] = &[
    (1, "||"),
    (2, "&&"),
    (3, "=="),
    (3, "!="),
    (4, "<"),
    (4, ">"),
    (4, "<="),
    (4, ">="),
    (5, "+"),
    (5, "-"),
    (6, "*"),
    (6, "/"),
    (6, "%"),
    (7, "**"),
    (7, "<>"),
];

const USER_OPERATOR_PRECEDENCE: i32 = 50;

const IDENTIFIER: &str = "[a-zA-Z_][a-zA-Z0-9_]*";
// Alternatives are tried in order, so the longer form comes first.
const OPERATOR: &str = r"[-+*/%=<>&|^!?][-+*/%=<>&|^!?]+|[-+*/%<>&|^!?]";
const NUMBER: &str = r"[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)";
const STRING: &str = r#""(?:[^\\\n"]|\\[\\"tnvfr]|\\u\{[0-9a-fA-F]+\}|\\\r?\n)*""#;
const COMMENT: &str = r"//[^\n]*|/\*[^*]*\*+(?:[^/*][^*]*\*+)*/";

/// Either kind of block as a body.
fn body() -> RuleExpr {
    field("body", choice([sym("block_statement"), sym("block_expression")]))
}

fn arguments(open: &str, close: &str) -> RuleExpr {
    seq([
        lit(open),
        sep_by(
            field("args", choice([sym("positional_argument"), sym("named_argument")])),
            ",",
        ),
        lit(close),
    ])
}

/// `ident` with an optional `: type` annotation, inlined.
fn maybe_typed() -> RuleExpr {
    seq([
        field("ident", sym("identifier")),
        optional(seq([lit(":"), field("type_ident", sym("identifier"))])),
    ])
}

/// The full grammar, ready to build.
pub fn grammar() -> GrammarBuilder {
    let mut g = GrammarBuilder::new("frugurt");

    g.token("identifier", TokenPattern::Regex(IDENTIFIER.into()))
        .token("operator", TokenPattern::Regex(OPERATOR.into()))
        .token("number_literal", TokenPattern::Regex(NUMBER.into()))
        .token("string_literal", TokenPattern::Regex(STRING.into()))
        .token("comment", TokenPattern::Regex(COMMENT.into()))
        .token("_whitespace", TokenPattern::Regex(r"\s+".into()))
        .extra("_whitespace")
        .extra("comment");

    g.rule("source_file", repeat(field("body", sym("_statement"))));

    statements(&mut g);
    types(&mut g);
    expressions(&mut g);

    g.recovery_boundary("_statement")
        .recovery_boundary("_type_member")
        .recovery_boundary("type_method");
    g
}

fn statements(g: &mut GrammarBuilder) {
    g.rule(
        "_statement",
        choice([
            sym("block_statement"),
            sym("scope_modifier_statement"),
            sym("expression_statement"),
            sym("let_statement"),
            sym("set_statement"),
            sym("set_prop_statement"),
            sym("if_statement"),
            sym("while_statement"),
            sym("return_statement"),
            sym("break_statement"),
            sym("continue_statement"),
            sym("operator_statement"),
            sym("type_statement"),
        ]),
    )
    .rule(
        "block_statement",
        seq([lit("{"), repeat(field("body", sym("_statement"))), lit("}")]),
    )
    .rule(
        "scope_modifier_statement",
        seq([
            lit("scope"),
            field("what", sym("_expression")),
            lit("{"),
            repeat(field("body", sym("_statement"))),
            lit("}"),
        ]),
    )
    .rule(
        "expression_statement",
        seq([field("value", sym("_expression")), lit(";")]),
    )
    .rule(
        "let_statement",
        seq([
            lit("let"),
            field("ident", sym("identifier")),
            lit("="),
            field("value", sym("_expression")),
            lit(";"),
        ]),
    )
    .rule(
        "set_statement",
        seq([
            field("ident", sym("identifier")),
            lit("="),
            field("value", sym("_expression")),
            lit(";"),
        ]),
    )
    .rule(
        "set_prop_statement",
        seq([
            field("what", sym("_expression_unit")),
            lit("."),
            field("ident", sym("identifier")),
            lit("="),
            field("value", sym("_expression")),
            lit(";"),
        ]),
    )
    .rule(
        "if_statement",
        seq([
            lit("if"),
            field("condition", sym("_expression")),
            field("then_body", sym("block_statement")),
            optional(seq([
                lit("else"),
                field(
                    "else_body",
                    choice([sym("if_statement"), sym("block_statement")]),
                ),
            ])),
        ]),
    )
    .rule(
        "while_statement",
        seq([
            lit("while"),
            field("condition", sym("_expression")),
            field("body", sym("block_statement")),
        ]),
    )
    .rule(
        "return_statement",
        seq([
            lit("return"),
            optional(field("value", sym("_expression"))),
            lit(";"),
        ]),
    )
    .rule("break_statement", seq([lit("break"), lit(";")]))
    .rule("continue_statement", seq([lit("continue"), lit(";")]))
    .rule(
        "operator_statement",
        seq([
            optional(field("commutative", lit("commutative"))),
            lit("operator"),
            field("ident", sym("operator")),
            lit("("),
            typed_pair("left"),
            lit(","),
            typed_pair("right"),
            lit(")"),
            body(),
        ]),
    );
}

/// `ident : type` with the type required, as operator operands are. The
/// fields are `{side}_ident` and `{side}_type_ident`.
fn typed_pair(side: &str) -> RuleExpr {
    seq([
        field(&format!("{side}_ident"), sym("identifier")),
        lit(":"),
        field(&format!("{side}_type_ident"), sym("identifier")),
    ])
}

fn types(g: &mut GrammarBuilder) {
    let modifiers = || {
        [
            optional(field("pub", lit("pub"))),
            optional(field("static", lit("static"))),
        ]
    };

    g.rule(
        "type_statement",
        seq([
            field("type_type", sym("type_type")),
            field("ident", sym("identifier")),
            lit("{"),
            repeat(field("members", sym("_type_member"))),
            lit("}"),
            optional(field("impl", sym("type_impl"))),
        ]),
    )
    .rule(
        "type_type",
        choice([lit("struct"), lit("class"), lit("data")]),
    )
    .rule(
        "_type_member",
        choice([sym("type_field"), sym("type_property")]),
    )
    .rule(
        "maybe_typed_identifier",
        maybe_typed(),
    )
    .rule(
        "type_field",
        seq(modifiers().into_iter().chain([
            field("ident", sym("maybe_typed_identifier")),
            optional(seq([lit("="), field("value", sym("_expression"))])),
            lit(";"),
        ])),
    )
    .rule(
        "type_property",
        seq(modifiers().into_iter().chain([
            field("ident", sym("maybe_typed_identifier")),
            lit("{"),
            repeat(field("items", sym("type_property_item"))),
            lit("}"),
        ])),
    )
    .rule(
        "type_property_item",
        choice([
            seq([
                field("type", lit("get")),
                field("body", sym("block_expression")),
            ]),
            seq([
                field("type", lit("get")),
                lit("=>"),
                field("body", sym("_expression")),
                lit(";"),
            ]),
            seq([
                field("type", lit("set")),
                optional(seq([
                    lit("("),
                    field("value_ident", sym("maybe_typed_identifier")),
                    lit(")"),
                ])),
                field("body", sym("block_statement")),
            ]),
        ]),
    )
    .rule(
        "type_impl",
        seq([
            lit("impl"),
            lit("{"),
            repeat(field("methods", sym("type_method"))),
            lit("}"),
        ]),
    )
    .rule(
        "type_method",
        seq([
            optional(field("static", lit("static"))),
            field("ident", sym("identifier")),
            field("parameters", sym("formal_parameters")),
            body(),
        ]),
    );
}

fn expressions(g: &mut GrammarBuilder) {
    g.rule(
        "_expression",
        prec_left(
            0,
            choice([sym("_expression_unit"), sym("binary_expression")]),
        ),
    )
    .rule(
        "_expression_unit",
        choice([
            sym("_literal"),
            sym("variable"),
            sym("scope_expression"),
            sym("function_expression"),
            sym("parenthesized_expression"),
            sym("block_expression"),
            sym("scope_modifier_expression"),
            sym("call_expression"),
            sym("curry_call_expression"),
            sym("instantiation_expression"),
            sym("prop_access_expression"),
            sym("if_expression"),
            sym("import_expression"),
        ]),
    )
    .rule(
        "_literal",
        choice([
            sym("number_literal"),
            sym("string_literal"),
            sym("bool_literal"),
            sym("nah_literal"),
        ]),
    )
    .rule("bool_literal", choice([lit("true"), lit("false")]))
    .rule("nah_literal", lit("nah"))
    .rule("variable", field("ident", sym("identifier")))
    .rule("scope_expression", seq([lit("scope"), lit("("), lit(")")]))
    .rule(
        "function_expression",
        seq([
            lit("fn"),
            field("parameters", sym("formal_parameters")),
            body(),
        ]),
    )
    .rule(
        "formal_parameters",
        seq([
            lit("("),
            sep_by(
                field(
                    "args",
                    choice([sym("positional_parameter"), sym("default_parameter")]),
                ),
                ",",
            ),
            lit(")"),
        ]),
    )
    .rule("positional_parameter", maybe_typed())
    .rule(
        "default_parameter",
        seq([maybe_typed(), lit("="), field("value", sym("_expression"))]),
    )
    .rule(
        "parenthesized_expression",
        seq([lit("("), field("expr", sym("_expression")), lit(")")]),
    )
    .rule(
        "block_expression",
        seq([
            lit("{"),
            repeat(field("body", sym("_statement"))),
            field("expr", sym("_expression")),
            lit("}"),
        ]),
    )
    .rule(
        "scope_modifier_expression",
        seq([
            lit("scope"),
            field("what", sym("_expression")),
            lit("{"),
            repeat(field("body", sym("_statement"))),
            field("expr", sym("_expression")),
            lit("}"),
        ]),
    )
    .rule(
        "call_expression",
        applied("argument_list_call"),
    )
    .rule(
        "curry_call_expression",
        applied("argument_list_curry_call"),
    )
    .rule(
        "instantiation_expression",
        applied("argument_list_instantiation"),
    )
    .rule_as("argument_list_call", "argument_list", arguments("(", ")"))
    .rule_as("argument_list_curry_call", "argument_list", arguments("$(", ")"))
    .rule_as("argument_list_instantiation", "argument_list", arguments(":{", "}"))
    .rule("positional_argument", field("value", sym("_expression")))
    .rule(
        "named_argument",
        seq([
            field("ident", sym("identifier")),
            lit(":"),
            field("value", sym("_expression")),
        ]),
    )
    .rule(
        "prop_access_expression",
        seq([
            field("what", sym("_expression_unit")),
            lit("."),
            field("ident", sym("identifier")),
        ]),
    )
    .rule(
        "binary_expression",
        choice(
            BINARY_OPERATORS
                .iter()
                .map(|&(precedence, op)| binary(precedence, lit(op)))
                .chain([binary(USER_OPERATOR_PRECEDENCE, sym("operator"))]),
        ),
    )
    .rule(
        "if_expression",
        seq([
            lit("if"),
            field("condition", sym("_expression")),
            field("then_body", sym("block_expression")),
            lit("else"),
            field(
                "else_body",
                choice([sym("block_expression"), sym("if_expression")]),
            ),
        ]),
    )
    .rule(
        "import_expression",
        seq([lit("import"), field("path", sym("_expression"))]),
    );
}

fn binary(precedence: i32, operator: RuleExpr) -> RuleExpr {
    prec_left(
        precedence,
        seq([
            field("left", sym("_expression")),
            field("operator", operator),
            field("right", sym("_expression")),
        ]),
    )
}

/// `what` applied to an argument list: calls, curried calls and
/// instantiations.
fn applied(arguments: &str) -> RuleExpr {
    seq([field("what", sym("_expression_unit")), field("args", sym(arguments))])
}
