use crate::ast::visitor::Visitor;
use crate::ast::*;

/// Renders a program as S-expressions. Statements in a block go on their own
/// indented line; expressions stay on one line.
pub struct SExprFormatter {
    output: String,
    indent: usize,
}

impl Default for SExprFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl SExprFormatter {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    pub fn format(program: &Program<'_>) -> String {
        let mut formatter = Self::new();
        formatter.program(program);
        formatter.finish()
    }

    pub fn finish(self) -> String {
        self.output
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn newline(&mut self) {
        self.output.push('\n');
        for _ in 0..self.indent {
            self.output.push_str("  ");
        }
    }

    fn program(&mut self, program: &Program<'_>) {
        self.write("(program");
        self.indent += 1;
        for stmt in program.statements {
            self.newline();
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.write(")");
    }

    /// Space separated expressions, each preceded by a space.
    fn exprs(&mut self, exprs: &[ExprId<'_>]) {
        for expr in exprs {
            self.write(" ");
            self.expr(expr);
        }
    }

    fn list(&mut self, head: &str, exprs: &[ExprId<'_>]) {
        self.write("(");
        self.write(head);
        self.exprs(exprs);
        self.write(")");
    }

    fn params(&mut self, params: &[Param<'_>]) {
        self.write("(params");
        for param in params {
            self.write(" ");
            let wrapped = param.type_hint.is_some() || param.default.is_some();
            if wrapped {
                self.write("(param");
                if let Some(hint) = param.type_hint {
                    self.write(" ");
                    self.write(hint);
                }
                self.write(" ");
            }
            if param.variadic {
                self.write("...");
            }
            self.expr(param.var);
            if wrapped {
                if let Some(default) = param.default {
                    self.write(" ");
                    self.expr(default);
                }
                self.write(")");
            }
        }
        self.write(")");
    }

    fn return_type(&mut self, return_type: Option<&str>) {
        if let Some(ty) = return_type {
            self.write(" (returns ");
            self.write(ty);
            self.write(")");
        }
    }

    fn optional(&mut self, head: &str, expr: Option<ExprId<'_>>) {
        self.write("(");
        self.write(head);
        if let Some(expr) = expr {
            self.write(" ");
            self.expr(expr);
        }
        self.write(")");
    }

    fn constant(&mut self, constant: &Constant<'_>) {
        self.write("(");
        self.write(constant.name);
        if let Some(value) = constant.value {
            self.write(" ");
            self.expr(value);
        }
        self.write(")");
    }

    fn modifiers(&mut self, modifiers: &Modifiers) {
        self.write(modifiers.visibility.as_str());
        if modifiers.is_static {
            self.write(" static");
        }
        if modifiers.is_abstract {
            self.write(" abstract");
        }
        if modifiers.is_final {
            self.write(" final");
        }
    }

    fn members(&mut self, constants: &[Constant<'_>], properties: &[Property<'_>], methods: &[Method<'_>]) {
        self.indent += 1;
        for constant in constants {
            self.newline();
            self.write("(const ");
            self.constant(constant);
            self.write(")");
        }
        for property in properties {
            self.newline();
            self.write("(property ");
            self.write(property.visibility.as_str());
            if property.is_static {
                self.write(" static");
            }
            if let Some(hint) = property.type_hint {
                self.write(" ");
                self.write(hint);
            }
            self.write(" $");
            self.write(property.name);
            if let Some(default) = property.default {
                self.write(" ");
                self.expr(default);
            }
            self.write(")");
        }
        for method in methods {
            self.newline();
            self.write("(method ");
            self.modifiers(&method.modifiers);
            self.write(" ");
            self.write(method.name);
            self.write(" ");
            self.params(method.params);
            self.return_type(method.return_type);
            if let Some(body) = method.body {
                self.write(" ");
                self.stmt(body);
            }
            self.write(")");
        }
        self.indent -= 1;
    }

    fn names(&mut self, head: &str, names: &[&str]) {
        if names.is_empty() {
            return;
        }
        self.write(" (");
        self.write(head);
        for name in names {
            self.write(" ");
            self.write(name);
        }
        self.write(")");
    }

    fn stmt(&mut self, stmt: &Stmt<'_>) {
        match stmt {
            Stmt::Expression { expr, .. } => self.expr(expr),
            Stmt::Block { statements, .. } => {
                self.write("(block");
                self.indent += 1;
                for stmt in *statements {
                    self.newline();
                    self.stmt(stmt);
                }
                self.indent -= 1;
                self.write(")");
            }
            Stmt::Echo { exprs, .. } => self.list("echo", exprs),
            Stmt::Return { expr, .. } => self.optional("return", *expr),
            Stmt::Break { expr, .. } => self.optional("break", *expr),
            Stmt::Continue { expr, .. } => self.optional("continue", *expr),
            Stmt::Throw { expr, .. } => self.optional("throw", *expr),
            Stmt::If {
                branches,
                else_block,
                ..
            } => {
                self.write("(if");
                self.indent += 1;
                for branch in *branches {
                    self.newline();
                    self.write("(branch ");
                    self.expr(branch.condition);
                    self.write(" ");
                    self.stmt(branch.body);
                    self.write(")");
                }
                if let Some(else_block) = else_block {
                    self.newline();
                    self.write("(else ");
                    self.stmt(else_block);
                    self.write(")");
                }
                self.indent -= 1;
                self.write(")");
            }
            Stmt::While {
                condition, body, ..
            } => {
                self.write("(while ");
                self.expr(condition);
                self.write(" ");
                self.stmt(body);
                self.write(")");
            }
            Stmt::DoWhile {
                body, condition, ..
            } => {
                self.write("(do ");
                self.stmt(body);
                self.write(" ");
                self.expr(condition);
                self.write(")");
            }
            Stmt::For {
                init,
                condition,
                step,
                body,
                ..
            } => {
                self.write("(for ");
                self.list("init", init);
                self.write(" ");
                self.list("cond", condition);
                self.write(" ");
                self.list("step", step);
                self.write(" ");
                self.stmt(body);
                self.write(")");
            }
            Stmt::Foreach {
                source,
                key,
                value,
                by_ref,
                body,
                ..
            } => {
                self.write("(foreach ");
                self.expr(source);
                if let Some(key) = key {
                    self.write(" (key ");
                    self.expr(key);
                    self.write(")");
                }
                self.write(" (value ");
                if *by_ref {
                    self.write("&");
                }
                self.expr(value);
                self.write(") ");
                self.stmt(body);
                self.write(")");
            }
            Stmt::Switch {
                subject,
                cases,
                default,
                ..
            } => {
                self.write("(switch ");
                self.expr(subject);
                self.indent += 1;
                for case in *cases {
                    self.newline();
                    self.write("(case ");
                    self.expr(case.expr);
                    self.write(" ");
                    self.stmt(case.body);
                    self.write(")");
                }
                if let Some(default) = default {
                    self.newline();
                    self.write("(default ");
                    self.stmt(default);
                    self.write(")");
                }
                self.indent -= 1;
                self.write(")");
            }
            Stmt::Try {
                body,
                catches,
                finally,
                ..
            } => {
                self.write("(try ");
                self.stmt(body);
                for catch in *catches {
                    self.write(" (catch (");
                    self.write(&catch.types.join(" "));
                    self.write(") ");
                    self.expr(catch.var);
                    self.write(" ");
                    self.stmt(catch.body);
                    self.write(")");
                }
                if let Some(finally) = finally {
                    self.write(" (finally ");
                    self.stmt(finally);
                    self.write(")");
                }
                self.write(")");
            }
            Stmt::Function { decl, .. } => {
                self.write("(function ");
                self.write(decl.name);
                self.write(" ");
                self.params(decl.params);
                self.return_type(decl.return_type);
                self.write(" ");
                self.stmt(decl.body);
                self.write(")");
            }
            Stmt::Class { decl, .. } => {
                self.write("(class ");
                self.write(decl.name);
                match decl.modifier {
                    Some(ClassModifier::Abstract) => self.write(" abstract"),
                    Some(ClassModifier::Final) => self.write(" final"),
                    None => {}
                }
                if let Some(parent) = decl.extends {
                    self.names("extends", &[parent]);
                }
                self.names("implements", decl.implements);
                self.members(decl.constants, decl.properties, decl.methods);
                self.write(")");
            }
            Stmt::Interface { decl, .. } => {
                self.write("(interface ");
                self.write(decl.name);
                self.names("extends", decl.extends);
                self.members(decl.constants, &[], decl.methods);
                self.write(")");
            }
            Stmt::Const { constants, .. } => {
                self.write("(const");
                for constant in *constants {
                    self.write(" ");
                    self.constant(constant);
                }
                self.write(")");
            }
            Stmt::Global { vars, .. } => self.list("global", vars),
            Stmt::Static { vars, .. } => {
                self.write("(static");
                for var in *vars {
                    self.write(" ");
                    match var.default {
                        Some(default) => {
                            self.write("(= ");
                            self.expr(var.var);
                            self.write(" ");
                            self.expr(default);
                            self.write(")");
                        }
                        None => self.expr(var.var),
                    }
                }
                self.write(")");
            }
            Stmt::Declare {
                directives, body, ..
            } => {
                self.write("(declare");
                for directive in *directives {
                    self.write(" (");
                    self.write(directive.name);
                    self.write(" ");
                    self.expr(directive.value);
                    self.write(")");
                }
                if let Some(body) = body {
                    self.write(" ");
                    self.stmt(body);
                }
                self.write(")");
            }
            Stmt::Nop { .. } => self.write("(nop)"),
        }
    }

    fn expr(&mut self, expr: &Expr<'_>) {
        match expr {
            Expr::Literal {
                kind: LiteralKind::String,
                value,
                ..
            } if !(value.starts_with(['\'', '"']) || value.starts_with("<<<")) => {
                // template text
                self.write(&format!("{value:?}"));
            }
            Expr::Literal { value, .. } => self.write(value),
            Expr::Identifier { name, .. } | Expr::ConstantRef { name, .. } => self.write(name),
            Expr::Variable { name, .. } => match name {
                VarName::Static(name) => {
                    self.write("$");
                    self.write(name);
                }
                VarName::Dynamic(inner) => {
                    self.write("${");
                    self.expr(inner);
                    self.write("}");
                }
            },
            Expr::Binary {
                left, op, right, ..
            } => {
                self.write("(");
                self.write(op.as_str());
                self.write(" ");
                self.expr(left);
                self.write(" ");
                self.expr(right);
                self.write(")");
            }
            Expr::Unary {
                op,
                operand,
                postfix,
                ..
            } => {
                self.write("(");
                match op {
                    UnaryOp::Cast(kind) => {
                        self.write("cast ");
                        self.write(kind.as_str());
                    }
                    _ if *postfix => {
                        self.write("post");
                        self.write(op.as_str());
                    }
                    _ => self.write(op.as_str()),
                }
                self.write(" ");
                self.expr(operand);
                self.write(")");
            }
            Expr::Ternary {
                condition,
                if_true,
                if_false,
                ..
            } => {
                self.write(if if_true.is_some() { "(? " } else { "(?: " });
                self.expr(condition);
                if let Some(if_true) = if_true {
                    self.write(" ");
                    self.expr(if_true);
                }
                self.write(" ");
                self.expr(if_false);
                self.write(")");
            }
            Expr::Assign {
                target, op, value, ..
            } => {
                self.write("(");
                self.write(op.as_str());
                self.write(" ");
                self.expr(target);
                self.write(" ");
                self.expr(value);
                self.write(")");
            }
            Expr::Call { callee, args, .. } => {
                self.write("(call ");
                self.expr(callee);
                self.exprs(args);
                self.write(")");
            }
            Expr::MethodCall {
                receiver,
                method,
                args,
                ..
            } => {
                self.write("(method-call ");
                self.expr(receiver);
                self.write(" ");
                self.expr(method);
                self.exprs(args);
                self.write(")");
            }
            Expr::PropertyFetch {
                receiver, property, ..
            } => {
                self.write("(-> ");
                self.expr(receiver);
                self.write(" ");
                self.expr(property);
                self.write(")");
            }
            Expr::ClassLookup { class, member, .. } => {
                self.write("(:: ");
                self.expr(class);
                self.write(" ");
                self.expr(member);
                self.write(")");
            }
            Expr::New { class, args, .. } => {
                self.write("(new ");
                self.expr(class);
                self.exprs(args);
                self.write(")");
            }
            Expr::Array { items, .. } => {
                self.write("(array");
                for item in *items {
                    self.write(" ");
                    if let Some(key) = item.key {
                        self.write("(=> ");
                        self.expr(key);
                        self.write(" ");
                    }
                    if item.by_ref {
                        self.write("&");
                    }
                    self.expr(item.value);
                    if item.key.is_some() {
                        self.write(")");
                    }
                }
                self.write(")");
            }
            Expr::ArrayLookup { array, index, .. } => {
                self.write("(index ");
                self.expr(array);
                self.write(" ");
                self.expr(index);
                self.write(")");
            }
            Expr::ArrayAppend { array, .. } => {
                self.write("(append ");
                self.expr(array);
                self.write(")");
            }
            Expr::ShellCommand { command, .. } => self.write(command),
            Expr::Include { kind, expr, .. } => {
                self.write("(");
                self.write(kind.as_str());
                self.write(" ");
                self.expr(expr);
                self.write(")");
            }
            Expr::Print { expr, .. } => {
                self.write("(print ");
                self.expr(expr);
                self.write(")");
            }
            Expr::Closure { decl, .. } => {
                self.write("(closure ");
                if decl.is_static {
                    self.write("static ");
                }
                self.params(decl.params);
                if !decl.uses.is_empty() {
                    self.write(" (use");
                    for used in decl.uses {
                        self.write(" ");
                        if used.by_ref {
                            self.write("&");
                        }
                        self.expr(used.var);
                    }
                    self.write(")");
                }
                self.return_type(decl.return_type);
                self.write(" ");
                self.stmt(decl.body);
                self.write(")");
            }
            Expr::List { items, .. } => {
                self.write("(list");
                for item in *items {
                    self.write(" ");
                    match item {
                        Some(item) => self.expr(item),
                        None => self.write("_"),
                    }
                }
                self.write(")");
            }
            Expr::Exit { expr, .. } => self.optional("exit", *expr),
            Expr::Error { .. } => self.write("(error)"),
        }
    }
}

impl<'ast> Visitor<'ast> for SExprFormatter {
    fn visit_program(&mut self, program: &'ast Program<'ast>) {
        self.program(program);
    }

    fn visit_stmt(&mut self, stmt: StmtId<'ast>) {
        self.stmt(stmt);
    }

    fn visit_expr(&mut self, expr: ExprId<'ast>) {
        self.expr(expr);
    }
}
