use sedna::{
    ast::{Item, Module},
    bytecode::CompiledFunction,
    stream, ErrorKind,
};

fn listing(function: &CompiledFunction) -> Vec<String> {
    function
        .instructions
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn test_build_program() {
    let source = r#"
    imports io
    scope app.main

    type Point {
        x: Int;
        y: Int;
    }

    // entry point
    @entry
    fn main(args: List<String>) {
        dec x;
        x = 1 + 2;
        /* branch on x */
        if (x > 2) {
            foo(x);
        } else {
            bar();
        }
    }
    "#;
    let functions = sedna::build(source).expect("Build should work on valid program");
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0].name, "main");
    assert_eq!(
        listing(&functions[0]),
        vec![
            "load.num(1,0)",
            "load.num(2,0)",
            "math.add",
            "store.local(x)",
            "load.local(x)",
            "load.num(2,0)",
            "cmp.greater",
            "flow.reljmpfalse(5)",
            "load.local(x)",
            "invoke(foo)",
            "stack.pop.one",
            "flow.reljmp(3)",
            "invoke(bar)",
            "stack.pop.one",
            "return",
        ]
    );
}

#[test]
fn test_parse_json_round_trip() {
    let source = r#"
    imports io
    fn main(a: Int, b: Map<String, List<Int>>) {
        dec m: reference Map<String, Int>;
        io.print("hi", 'c', 0x1F, 0b101, 3.14);
        if (a >= (b + 1)) { x = a.len; } else { y = f(g(a), 2); }
        for (i = 0; i < 3; i = i + 1) { step(i); }
    }
    "#;
    let module = sedna::parse(source).expect("Parse should work on valid program");
    let json = serde_json::to_string(&module).expect("Module should serialize");
    let back: Module = serde_json::from_str(&json).expect("Module should deserialize");
    assert_eq!(back, module);
}

#[test]
fn test_parse_json_shape() {
    let module = sedna::parse("fn f() { x = 1; }").unwrap();
    let value = serde_json::to_value(&module).unwrap();
    let function = &value["items"][0];
    assert_eq!(function["node"], "function");
    assert_eq!(function["name"], "f");
    let assignment = &function["body"][0];
    assert_eq!(assignment["node"], "assignment");
    assert_eq!(assignment["dst"], "x");
    assert_eq!(assignment["body"][0]["node"], "token");
    assert_eq!(assignment["body"][0]["token_type"]["type"], "number");
}

#[test]
fn test_stream_between_stages() {
    let modules = vec![
        sedna::parse("fn a() { x = 1; }").unwrap(),
        sedna::parse("fn b() { y(); }").unwrap(),
    ];
    let mut buffer = b"sedna parse output\n".to_vec();
    stream::write_modules(&mut buffer, &modules).unwrap();
    buffer.extend_from_slice(b"\n\n");

    let read = stream::read_modules(buffer.as_slice()).unwrap();
    assert_eq!(read, modules);

    let names: Vec<_> = read
        .iter()
        .flat_map(|module| sedna::compiler::compile(module).unwrap())
        .map(|function| function.name)
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_stream_without_sentinel() {
    let err = stream::read_modules("{\"items\":[]}".as_bytes()).unwrap_err();
    let err = sedna::Error::from(err);
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_unclosed_parameter_list() {
    let err = sedna::parse("imports io\nfn f( { }").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    let sedna::Error::Parse(err) = err else {
        panic!("expected parse error");
    };
    assert_eq!((err.span.start_line, err.span.start_column), (2, 1));
}

#[test]
fn test_lex_error() {
    let err = sedna::parse("fn f() { x = 1 # 2; }").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lex);
    assert!(err.to_string().contains("1,16"));
}

#[test]
fn test_unterminated_string_is_syntax_error() {
    let err = sedna::parse("fn f() { x = \"abc; }").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
}

#[test]
fn test_conflicting_qualifiers() {
    let err = sedna::build("fn f() { dec x: copy move Int; }").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SemanticConstraint);
}

#[test]
fn test_duplicate_function() {
    let err = sedna::build("fn f() { } fn f() { }").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SemanticConstraint);
}

#[test]
fn test_for_loop_is_not_lowered() {
    let module = sedna::parse("fn f() { for (i = 0; i < 2; i = i + 1) { g(); } }").unwrap();
    assert!(matches!(module.items[0], Item::Function { .. }));
    let err = sedna::build("fn f() { for (i = 0; i < 2; i = i + 1) { g(); } }").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InternalCompiler);
}

#[test]
fn test_stray_statement() {
    let err = sedna::build("fn f() { 42; }").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InternalCompiler);
}

#[test]
fn test_trailing_operator() {
    let err = sedna::build("fn f() { x = a *; }").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
}

#[test]
fn test_generic_parameter_groups() {
    let module = sedna::parse("fn f(a: Int, b: Map<String, List<Int>>) { }").unwrap();
    let Item::Function { params, .. } = &module.items[0] else {
        panic!("expected function");
    };
    assert_eq!(params.len(), 3);
    assert_eq!(params[0].len(), 3);
}

#[test]
fn test_dangling_else_is_syntax_error() {
    let err = sedna::build("fn f() { x = 1; else { y(); } }").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
}
