//! Lexer tests

use proptest::prelude::*;
use wrapidl::CompileError;
use wrapidl::lexer::{TokenKind, TokenStream, lex_str};

fn kinds(source: &str) -> Vec<TokenKind> {
    lex_str(source).unwrap().into_iter().map(|t| t.kind).collect()
}

#[test]
fn test_lex_empty() {
    assert_eq!(kinds(""), vec![TokenKind::Eof]);
    assert_eq!(kinds("  \n\t // only a comment\n"), vec![TokenKind::Eof]);
}

#[test]
fn test_lex_keywords() {
    assert_eq!(
        kinds("namespace class static const"),
        vec![
            TokenKind::Namespace,
            TokenKind::Class,
            TokenKind::Static,
            TokenKind::Const,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_keyword_prefix_is_identifier() {
    let tokens = lex_str("classes constant staticMethod").unwrap();
    assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::Ident));
    assert_eq!(tokens[0].text, "classes");
}

#[test]
fn test_lex_signature() {
    assert_eq!(
        kinds("static gtsam::Point2 Expmap(const Vector& v);"),
        vec![
            TokenKind::Static,
            TokenKind::Ident,
            TokenKind::ColonColon,
            TokenKind::Ident,
            TokenKind::Ident,
            TokenKind::LParen,
            TokenKind::Const,
            TokenKind::Ident,
            TokenKind::Amp,
            TokenKind::Ident,
            TokenKind::RParen,
            TokenKind::Semi,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_lex_shared_pointer_and_raw_pointer() {
    assert_eq!(
        kinds("boost::shared_ptr<A> f(); A* g();"),
        vec![
            TokenKind::Ident,
            TokenKind::ColonColon,
            TokenKind::Ident,
            TokenKind::Lt,
            TokenKind::Ident,
            TokenKind::Gt,
            TokenKind::Ident,
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::Semi,
            TokenKind::Ident,
            TokenKind::Star,
            TokenKind::Ident,
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::Semi,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_include_is_one_token() {
    let tokens = lex_str("#include <gtsam/geometry/Pose2.h>\nclass Pose2;").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Include);
    assert_eq!(tokens[0].text, "#include <gtsam/geometry/Pose2.h>");
    assert_eq!(tokens[1].kind, TokenKind::Class);
    assert_eq!(tokens[1].line(), 2);
}

#[test]
fn test_namespace_end_marker_variants() {
    for src in ["}///\\namespace", "} ///\\namespace", "}\t///\\namespace"] {
        assert_eq!(kinds(src), vec![TokenKind::NamespaceEnd, TokenKind::Eof], "{src}");
    }
    let tokens = lex_str("}///\\namespace gtsam\n").unwrap();
    assert_eq!(tokens[1].kind, TokenKind::Ident);
    assert_eq!(tokens[1].text, "gtsam");
}

#[test]
fn test_plain_brace_followed_by_blanks() {
    let cases = [
        ("} }", vec![TokenKind::RBrace, TokenKind::RBrace, TokenKind::Eof]),
        ("} \n;", vec![TokenKind::RBrace, TokenKind::Semi, TokenKind::Eof]),
        ("} // x", vec![TokenKind::RBrace, TokenKind::Eof]),
        ("} /* c */", vec![TokenKind::RBrace, TokenKind::Eof]),
        ("}\t///", vec![TokenKind::RBrace, TokenKind::Eof]),
        ("}\n///\\namespace", vec![TokenKind::RBrace, TokenKind::Eof]),
    ];
    for (src, expected) in cases {
        assert_eq!(kinds(src), expected, "{src:?}");
    }
}

#[test]
fn test_comments_are_skipped() {
    let src = "// header\n/* block\n   comment */ class /* inline */ A; // trailing";
    assert_eq!(
        kinds(src),
        vec![TokenKind::Class, TokenKind::Ident, TokenKind::Semi, TokenKind::Eof]
    );
}

#[test]
fn test_banner_comments() {
    let src = "//****************\n// geometry\n//****************\n/* ***** *\n * x\n * ***** */\nclass A;";
    let tokens = lex_str(src).unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Class);
    assert_eq!(tokens[0].line(), 7);
}

#[test]
fn test_line_numbers() {
    let tokens = lex_str("class A {\n  A();\n\n  int f();\n};").unwrap();
    let lines: Vec<usize> = tokens.iter().map(|t| t.line()).collect();
    assert_eq!(lines, vec![1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 5, 5, 5]);
}

#[test]
fn test_literals() {
    assert_eq!(
        kinds("42 3.14 \"text\""),
        vec![
            TokenKind::IntLit,
            TokenKind::FloatLit,
            TokenKind::StringLit,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_unterminated_block_comment() {
    let err = lex_str("class A;\n\n/* never\nclosed").unwrap_err();
    match err {
        CompileError::UnterminatedComment { line, .. } => assert_eq!(line, 3),
        other => panic!("Expected unterminated comment, got {other:?}"),
    }
}

#[test]
fn test_unterminated_string() {
    let err = lex_str("class A;\n\"open").unwrap_err();
    assert!(matches!(err, CompileError::UnterminatedString { line: 2, .. }));
}

#[test]
fn test_unknown_characters_become_tokens() {
    let tokens = lex_str("int f() ~ @;").unwrap();
    let unknown: Vec<&str> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Unknown)
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(unknown, vec!["~", "@"]);
}

#[test]
fn test_stream_is_lazy() {
    // the unterminated comment is only reached on the third pull
    let mut stream = TokenStream::new("class A /* open");
    assert_eq!(stream.next().unwrap().unwrap().kind, TokenKind::Class);
    assert_eq!(stream.next().unwrap().unwrap().kind, TokenKind::Ident);
    assert!(stream.next().unwrap().is_err());
    assert!(stream.next().is_none());
}

proptest! {
    #[test]
    fn lexing_never_panics(src in "\\PC{0,200}") {
        let _ = lex_str(&src);
    }

    #[test]
    fn lines_never_decrease(src in "[a-z{}();:&*<> \n/]{0,200}") {
        if let Ok(tokens) = lex_str(&src) {
            for pair in tokens.windows(2) {
                prop_assert!(pair[0].line() <= pair[1].line());
            }
            let last = tokens.last().unwrap();
            prop_assert_eq!(last.kind, TokenKind::Eof);
            prop_assert_eq!(last.line(), 1 + src.matches('\n').count());
        }
    }
}
