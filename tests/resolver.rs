#[cfg(test)]
mod resolver_tests {
    use rox as lox;

    use lox::ast::{Expr, ExprId, Stmt};
    use lox::interpreter::Interpreter;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::scan_tokens;

    fn parse(source: &str) -> Vec<Option<Stmt>> {
        let (tokens, lex_errors) = scan_tokens(source);
        assert!(lex_errors.is_empty());

        let mut parser = Parser::new(tokens);
        let statements = parser.parse();
        assert!(!parser.had_error(), "parse errors: {:?}", parser.errors());

        statements
    }

    /// Resolve `source` and return the tree, the interpreter holding the
    /// resolution table, and the rendered errors.
    fn resolve(source: &str) -> (Vec<Stmt>, Interpreter, Vec<String>) {
        let statements = parse(source);
        let mut interpreter = Interpreter::new();

        let errors = {
            let mut resolver = Resolver::new(&mut interpreter);
            resolver.resolve(&statements);
            resolver.errors().iter().map(|e| e.to_string()).collect()
        };

        (statements.into_iter().flatten().collect(), interpreter, errors)
    }

    fn resolve_errors(source: &str) -> Vec<String> {
        resolve(source).2
    }

    fn block(stmt: &Stmt) -> Vec<&Stmt> {
        match stmt {
            Stmt::Block(inner) => inner.iter().flatten().collect(),
            other => panic!("expected block, got {:?}", other),
        }
    }

    fn printed_variable(stmt: &Stmt) -> ExprId {
        match stmt {
            Stmt::Print(Expr::Variable { id, .. }) => *id,
            other => panic!("expected `print <variable>`, got {:?}", other),
        }
    }

    fn method_body(stmt: &Stmt) -> Vec<&Stmt> {
        match stmt {
            Stmt::Class { methods, .. } => methods[0].body.iter().flatten().collect(),
            other => panic!("expected class, got {:?}", other),
        }
    }

    // ───────────────────────── hop counts ─────────────────────────

    #[test]
    fn test_globals_are_left_out_of_the_table() {
        let (statements, interpreter, errors) = resolve("var g = 1; print g;");

        assert!(errors.is_empty());
        assert_eq!(interpreter.resolved_depth(printed_variable(&statements[1])), None);
    }

    #[test]
    fn test_depth_counts_from_innermost_scope() {
        let (statements, interpreter, errors) =
            resolve("{ var a = 1; print a; { print a; { print a; } } }");
        assert!(errors.is_empty());

        let outer = block(&statements[0]);
        let middle = block(outer[2]);
        let inner = block(middle[1]);

        assert_eq!(interpreter.resolved_depth(printed_variable(outer[1])), Some(0));
        assert_eq!(interpreter.resolved_depth(printed_variable(middle[0])), Some(1));
        assert_eq!(interpreter.resolved_depth(printed_variable(inner[0])), Some(2));
    }

    #[test]
    fn test_shadowing_resolves_to_nearest_declaration() {
        let (statements, interpreter, errors) =
            resolve("{ var a = 1; { var a = 2; print a; } print a; }");
        assert!(errors.is_empty());

        let outer = block(&statements[0]);
        let inner = block(outer[1]);

        assert_eq!(interpreter.resolved_depth(printed_variable(inner[1])), Some(0));
        assert_eq!(interpreter.resolved_depth(printed_variable(outer[2])), Some(0));
    }

    #[test]
    fn test_parameters_share_the_body_scope() {
        let (statements, interpreter, errors) = resolve("fun f(x) { print x; }");
        assert!(errors.is_empty());

        let Stmt::Function(decl) = &statements[0] else {
            panic!("expected function");
        };
        let Some(body) = &decl.body[0] else {
            panic!("expected body statement");
        };

        assert_eq!(interpreter.resolved_depth(printed_variable(body)), Some(0));
    }

    #[test]
    fn test_this_sits_one_scope_outside_the_method() {
        let (statements, interpreter, errors) = resolve("class A { m() { print this; } }");
        assert!(errors.is_empty());

        let body = method_body(&statements[0]);
        let Stmt::Print(Expr::This { id, .. }) = body[0] else {
            panic!("expected `print this`");
        };

        assert_eq!(interpreter.resolved_depth(*id), Some(1));
    }

    #[test]
    fn test_super_sits_two_scopes_outside_the_method() {
        let (statements, interpreter, errors) =
            resolve("class A { m() {} } class B < A { m() { print super.m; } }");
        assert!(errors.is_empty());

        let body = method_body(&statements[1]);
        let Stmt::Print(Expr::Super { id, .. }) = body[0] else {
            panic!("expected `print super.m`");
        };

        assert_eq!(interpreter.resolved_depth(*id), Some(2));
    }

    #[test]
    fn test_discard_forgets_depths_of_a_failed_unit() {
        let statements = parse("{ var a = 1; print a; var a = 2; }");
        let body = block(statements[0].as_ref().unwrap());
        let id = printed_variable(body[1]);

        let mut kept = Interpreter::new();
        Resolver::new(&mut kept).resolve(&statements);
        assert_eq!(kept.resolved_depth(id), Some(0));

        let mut interpreter = Interpreter::new();
        let mut resolver = Resolver::new(&mut interpreter);
        resolver.resolve(&statements);
        assert!(resolver.had_error());
        resolver.discard();

        assert_eq!(interpreter.resolved_depth(id), None);
    }

    // ───────────────────────── static errors ─────────────────────────

    #[test]
    fn test_redeclaration_in_same_local_scope() {
        assert_eq!(
            resolve_errors("{ var a = 1; var a = 2; }"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_global_redeclaration_is_allowed() {
        assert!(resolve_errors("var a = 1; var a = 2;").is_empty());
    }

    #[test]
    fn test_duplicate_parameter() {
        assert_eq!(
            resolve_errors("fun f(a, a) {}"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_read_in_own_initializer() {
        assert_eq!(
            resolve_errors("{ var a = a; }"),
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_initializer_may_read_outer_variable_of_same_name() {
        // The inner `a` is still being declared, so this reads the global one.
        let errors = resolve_errors("var a = 1; { var b = a; }");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_return_at_top_level() {
        assert_eq!(
            resolve_errors("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn test_return_value_from_initializer() {
        assert_eq!(
            resolve_errors("class A { init() { return 1; } }"),
            vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
        );
    }

    #[test]
    fn test_bare_return_from_initializer_is_allowed() {
        assert!(resolve_errors("class A { init() { return; } }").is_empty());
    }

    #[test]
    fn test_this_outside_class() {
        assert_eq!(
            resolve_errors("print this;"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
        assert_eq!(
            resolve_errors("fun f() { return this; }"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
    }

    #[test]
    fn test_super_outside_class() {
        assert_eq!(
            resolve_errors("print super.m;"),
            vec!["[line 1] Error at 'super': Can't use 'super' outside of a class."]
        );
    }

    #[test]
    fn test_super_without_superclass() {
        assert_eq!(
            resolve_errors("class A { m() { super.m(); } }"),
            vec!["[line 1] Error at 'super': Can't use 'super' in a class with no superclass."]
        );
    }

    #[test]
    fn test_class_inheriting_from_itself() {
        assert_eq!(
            resolve_errors("class A < A {}"),
            vec!["[line 1] Error at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_errors_accumulate() {
        let errors = resolve_errors("return 1;\nprint this;\n{ var x = 1; var x = 2; }");

        assert_eq!(
            errors,
            vec![
                "[line 1] Error at 'return': Can't return from top-level code.",
                "[line 2] Error at 'this': Can't use 'this' outside of a class.",
                "[line 3] Error at 'x': Already a variable with this name in this scope.",
            ]
        );
    }
}
