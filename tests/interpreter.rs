#[cfg(test)]
mod interpreter_tests {
    use rox as lox;

    use lox::ast::{Expr, Stmt};
    use lox::callable::{Callable, NativeFunction};
    use lox::environment::Environment;
    use lox::error::LoxError;
    use lox::interpreter::Interpreter;
    use lox::lox::CapturedOutput;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::scan_tokens;
    use lox::token::{Token, TokenType};
    use lox::value::Value;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    fn parse(source: &str) -> Vec<Option<Stmt>> {
        let (tokens, _) = scan_tokens(source);
        let mut parser = Parser::new(tokens);
        let statements = parser.parse();
        assert!(!parser.had_error(), "parse errors: {:?}", parser.errors());
        statements
    }

    /// Parse, resolve and run `source` on a fresh interpreter.
    fn execute(source: &str) -> (Result<(), LoxError>, Vec<String>) {
        let output = CapturedOutput::new();
        let mut interpreter = Interpreter::with_output(Box::new(output.clone()));

        let statements = parse(source);
        {
            let mut resolver = Resolver::new(&mut interpreter);
            resolver.resolve(&statements);
            assert!(!resolver.had_error(), "resolve errors: {:?}", resolver.errors());
        }

        let result = interpreter.interpret(&statements);
        (result, output.lines())
    }

    fn evaluate(source: &str) -> Value {
        let mut interpreter = Interpreter::new();

        match parse(&format!("{};", source)).pop().flatten() {
            Some(Stmt::Expression(expr)) => interpreter
                .evaluate(&expr)
                .unwrap_or_else(|e| panic!("evaluation of {:?} failed: {}", source, e)),
            other => panic!("expected expression, got {:?}", other),
        }
    }

    fn runtime_error(source: &str) -> String {
        match execute(source).0 {
            Err(e) => {
                assert!(e.is_runtime());
                e.to_string()
            }
            Ok(()) => panic!("expected a runtime error from {:?}", source),
        }
    }

    // ───────────────────────── environment ─────────────────────────

    #[test]
    fn test_environment_get_walks_outward() {
        let globals = Environment::new();
        globals.define("a", Value::Number(1.0));

        let inner = Environment::with_enclosing(&Environment::with_enclosing(&globals));

        assert_eq!(inner.get(&ident("a")).ok(), Some(Value::Number(1.0)));
        assert_eq!(
            inner.get(&ident("b")).map_err(|e| e.to_string()),
            Err("Undefined variable 'b'.\n[line 1]".to_string())
        );
    }

    #[test]
    fn test_environment_assign_updates_nearest_binding() {
        let globals = Environment::new();
        globals.define("a", Value::Number(1.0));
        let inner = Environment::with_enclosing(&globals);

        assert!(inner.assign(&ident("a"), Value::Number(2.0)).is_ok());
        assert!(!inner.contains("a"));
        assert_eq!(globals.get(&ident("a")).ok(), Some(Value::Number(2.0)));

        assert!(inner.assign(&ident("missing"), Value::Nil).is_err());
    }

    #[test]
    fn test_environment_at_distance_skips_search() {
        let globals = Environment::new();
        globals.define("a", Value::from("global"));
        let middle = Environment::with_enclosing(&globals);
        middle.define("a", Value::from("middle"));
        let inner = Environment::with_enclosing(&middle);

        assert_eq!(inner.get_at(1, &ident("a")).ok(), Some(Value::from("middle")));
        assert_eq!(inner.get_at(2, &ident("a")).ok(), Some(Value::from("global")));
        assert!(inner.get_at(0, &ident("a")).is_err());

        inner.assign_at(2, &ident("a"), Value::from("changed"));
        assert_eq!(globals.get(&ident("a")).ok(), Some(Value::from("changed")));
        assert_eq!(middle.get(&ident("a")).ok(), Some(Value::from("middle")));
    }

    #[test]
    fn test_environment_clones_alias_one_frame() {
        let env = Environment::new();
        let alias = env.clone();

        alias.define("x", Value::Bool(true));

        assert!(env.contains("x"));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "exceeds environment chain")]
    fn test_environment_distance_past_root_is_caught() {
        let globals = Environment::new();
        let inner = Environment::with_enclosing(&globals);

        let _ = inner.get_at(2, &ident("a"));
    }

    // ───────────────────────── values ─────────────────────────

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::from("").is_truthy());
    }

    #[test]
    fn test_equality_never_crosses_types() {
        assert_eq!(Value::Nil, Value::Nil);
        assert_ne!(Value::Nil, Value::Bool(false));
        assert_ne!(Value::Number(0.0), Value::Bool(false));
        assert_ne!(Value::from("1"), Value::Number(1.0));
        assert_eq!(Value::from("a"), Value::from("a"));
    }

    #[test]
    fn test_stringification() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(3.5).to_string(), "3.5");
        assert_eq!(Value::Number(-12.0).to_string(), "-12");
        assert_eq!(Value::Nil.to_string(), "nil");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::from("text").to_string(), "text");
        assert_eq!(Value::Native(NativeFunction::clock()).to_string(), "<native fn>");
    }

    // ───────────────────────── expressions ─────────────────────────

    #[test]
    fn test_arithmetic_matches_ieee_doubles() {
        let cases: [(&str, f64); 7] = [
            ("1 + 2 * 3", 1.0 + 2.0 * 3.0),
            ("(1 + 2) * 3", (1.0 + 2.0) * 3.0),
            ("10 / 4", 10.0 / 4.0),
            ("0.1 + 0.2", 0.1 + 0.2),
            ("1 - 2 - 3", 1.0 - 2.0 - 3.0),
            ("-3 * -2.5", -3.0 * -2.5),
            ("7 / 3 * 3", 7.0 / 3.0 * 3.0),
        ];

        for (source, expected) in cases {
            assert_eq!(evaluate(source), Value::Number(expected), "{}", source);
        }
    }

    #[test]
    fn test_comparison_and_equality() {
        assert_eq!(evaluate("1 < 2"), Value::Bool(true));
        assert_eq!(evaluate("2 <= 2"), Value::Bool(true));
        assert_eq!(evaluate("1 > 2"), Value::Bool(false));
        assert_eq!(evaluate("3 >= 4"), Value::Bool(false));
        assert_eq!(evaluate("1 == 1"), Value::Bool(true));
        assert_eq!(evaluate("nil == false"), Value::Bool(false));
        assert_eq!(evaluate("\"a\" != \"b\""), Value::Bool(true));
        assert_eq!(evaluate("!nil"), Value::Bool(true));
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(evaluate("\"foo\" + \"bar\""), Value::from("foobar"));
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(evaluate("nil or \"yes\""), Value::from("yes"));
        assert_eq!(evaluate("1 or 2"), Value::Number(1.0));
        assert_eq!(evaluate("nil and 2"), Value::Nil);
        assert_eq!(evaluate("1 and 2"), Value::Number(2.0));
    }

    #[test]
    fn test_short_circuit_skips_right_operand() {
        let (result, output) = execute(
            "fun boom() { print \"evaluated\"; return true; }\n\
             print false and boom();\n\
             print true or boom();",
        );

        assert!(result.is_ok());
        assert_eq!(output, vec!["false", "true"]);
    }

    // ───────────────────────── runtime errors ─────────────────────────

    #[test]
    fn test_divide_by_zero_is_an_error() {
        assert_eq!(runtime_error("print 1 / 0;"), "Cannot divide by zero.\n[line 1]");
    }

    #[test]
    fn test_operand_type_errors() {
        assert_eq!(runtime_error("-\"a\";"), "Operand must be a number.\n[line 1]");
        assert_eq!(runtime_error("1 < \"a\";"), "Operands must be numbers.\n[line 1]");
        assert_eq!(
            runtime_error("1 + \"a\";"),
            "Operands must be two numbers or two strings.\n[line 1]"
        );
    }

    #[test]
    fn test_calling_non_callable() {
        assert_eq!(
            runtime_error("\"str\"();"),
            "Can only call functions and classes.\n[line 1]"
        );
    }

    #[test]
    fn test_arity_mismatch_names_both_counts() {
        assert_eq!(
            runtime_error("fun f(a, b) {}\nf(1);"),
            "Expected 2 arguments but got 1.\n[line 2]"
        );
        assert_eq!(
            runtime_error("clock(1);"),
            "Expected 0 arguments but got 1.\n[line 1]"
        );
    }

    #[test]
    fn test_arity_is_checked_before_the_body_runs() {
        let (result, output) = execute("fun f(a) { print \"ran\"; }\nf();");

        assert!(result.is_err());
        assert!(output.is_empty());
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(
            runtime_error("print missing;"),
            "Undefined variable 'missing'.\n[line 1]"
        );
        assert_eq!(
            runtime_error("missing = 1;"),
            "Undefined variable 'missing'.\n[line 1]"
        );
    }

    #[test]
    fn test_runtime_error_stops_remaining_statements() {
        let (result, output) = execute("print 1;\nprint nil + 1;\nprint 2;");

        assert!(result.is_err());
        assert_eq!(output, vec!["1"]);
    }

    #[test]
    fn test_state_survives_a_runtime_error() {
        let output = CapturedOutput::new();
        let mut interpreter = Interpreter::with_output(Box::new(output.clone()));

        let first = parse("var kept = \"still here\"; { var x = 1; x(); }");
        Resolver::new(&mut interpreter).resolve(&first);
        assert!(interpreter.interpret(&first).is_err());

        // Execution is back at the global scope.
        let second = parse("print kept;");
        Resolver::new(&mut interpreter).resolve(&second);
        assert!(interpreter.interpret(&second).is_ok());

        assert_eq!(output.lines(), vec!["still here"]);
        assert!(interpreter.globals().contains("kept"));
    }

    #[test]
    fn test_stray_return_reports_its_line() {
        let mut interpreter = Interpreter::new();

        // Skips the resolver, which would reject this statically.
        let statements = parse("var x = 1;\n\n{ return x; }");
        match interpreter.interpret(&statements) {
            Err(e) => {
                assert_eq!(e.line(), Some(3));
                assert_eq!(e.to_string(), "Can't return from top-level code.\n[line 3]");
            }
            Ok(()) => panic!("expected a runtime error"),
        }
    }

    #[test]
    fn test_error_lines() {
        let (_, lex_errors) = scan_tokens("\n@");
        assert_eq!(lex_errors[0].line(), Some(2));

        let (tokens, _) = scan_tokens("print 1;\n\nprint ;");
        let mut parser = Parser::new(tokens);
        parser.parse();
        assert_eq!(parser.errors()[0].line(), Some(3));

        let minus = Token::new(TokenType::MINUS, "-", 7);
        let runtime = LoxError::runtime(&minus, "Operand must be a number.");
        assert!(runtime.is_runtime());
        assert_eq!(runtime.line(), Some(7));

        let io = LoxError::from(std::io::Error::new(std::io::ErrorKind::Other, "closed"));
        assert!(!io.is_runtime());
        assert_eq!(io.line(), None);
    }

    // ───────────────────────── callables ─────────────────────────

    #[test]
    fn test_native_clock() {
        let clock = NativeFunction::clock();
        assert_eq!(clock.arity(), 0);
        assert_eq!(clock.name(), "clock");

        assert!(matches!(evaluate("clock()"), Value::Number(n) if n > 0.0));
    }

    #[test]
    fn test_function_display_and_identity() {
        let (result, output) = execute(
            "fun f() {}\n\
             var g = f;\n\
             print f;\n\
             print f == g;\n\
             class A { m() {} }\n\
             var a = A();\n\
             print A;\n\
             print a;\n\
             print a.m;\n\
             print a.m == a.m;\n\
             print a == a;\n\
             print A() == A();",
        );

        assert!(result.is_ok());
        assert_eq!(
            output,
            vec![
                "<fn f>",
                "true",
                "A",
                "A instance",
                "<fn m>",
                // Each access binds a fresh method.
                "false",
                "true",
                "false",
            ]
        );
    }

    #[test]
    fn test_evaluate_does_not_need_statements() {
        let mut interpreter = Interpreter::new();
        let expr = Expr::variable(ident("clock"));

        assert!(matches!(
            interpreter.evaluate(&expr),
            Ok(Value::Native(ref native)) if native.name() == "clock"
        ));
    }
}
