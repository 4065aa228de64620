//! Intermediate representation of the generated program
//!
//! The compiler assembles a [`Program`] of declarations and functions and
//! renders it to GLSL text in one place ([`Program::to_glsl`]). Tests can
//! inspect the structure (which functions exist, in which order) without
//! depending on exact formatting.

use std::fmt::Write;

/// Top-level declaration
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// `precision <text>;`
    Precision(String),
    /// `uniform <ty> <name>;`
    Uniform(Declaration),
    /// `varying <ty> <name>;`
    Varying(Declaration),
    /// `const <ty> <name> = <value>;`
    Constant {
        /// Name and type
        declaration: Declaration,
        /// Literal initializer
        value: String,
    },
    /// Struct definition
    Struct {
        /// Struct name
        name: String,
        /// Fields in declaration order
        fields: Vec<Declaration>,
    },
    /// Forward declaration of a function
    Prototype(Signature),
    /// Function definition
    Function(Function),
}

impl Item {
    /// Consecutive items of the same group render without a blank line
    fn group(&self) -> Option<u8> {
        match self {
            Item::Precision(_) => Some(0),
            Item::Uniform(_) | Item::Varying(_) => Some(1),
            Item::Constant { .. } => Some(2),
            Item::Prototype(_) => Some(3),
            Item::Struct { .. } | Item::Function(_) => None,
        }
    }

    fn render(&self, ctx: &mut RenderContext<'_>) {
        match self {
            Item::Precision(text) => ctx.line(&format!("precision {};", text)),
            Item::Uniform(d) => ctx.line(&format!("uniform {};", d)),
            Item::Varying(d) => ctx.line(&format!("varying {};", d)),
            Item::Constant { declaration, value } => {
                ctx.line(&format!("const {} = {};", declaration, value))
            }
            Item::Struct { name, fields } => {
                ctx.line(&format!("struct {} {{", name));
                ctx.indent();
                for field in fields {
                    ctx.line(&format!("{};", field));
                }
                ctx.dedent();
                ctx.line("};");
            }
            Item::Prototype(signature) => ctx.line(&format!("{};", signature)),
            Item::Function(function) => function.render(ctx),
        }
    }
}

/// A typed name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// GLSL type
    pub ty: String,
    /// Identifier
    pub name: String,
}

impl Declaration {
    /// `ty name`
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Declaration {
            ty: ty.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Declaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.ty, self.name)
    }
}

/// Function signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Return type
    pub return_ty: String,
    /// Function name
    pub name: String,
    /// Parameters
    pub params: Vec<Declaration>,
}

impl Signature {
    /// Signature from `(type, name)` parameter pairs
    pub fn new(return_ty: &str, name: impl Into<String>, params: &[(&str, &str)]) -> Self {
        Signature {
            return_ty: return_ty.to_string(),
            name: name.into(),
            params: params.iter().map(|(ty, name)| Declaration::new(*ty, *name)).collect(),
        }
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}(", self.return_ty, self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", p)?;
        }
        f.write_str(")")
    }
}

/// Statement inside a function body
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Single line (may carry its own relative indentation)
    Line(String),
    /// Empty line
    Blank,
    /// `header {` body `}`
    Block {
        /// Text before the brace, e.g. `if (x < y)`
        header: String,
        /// Nested statements
        body: Vec<Statement>,
    },
    /// Brace-less `header` followed by one indented statement
    Guard {
        /// Condition line, e.g. `if (object == 1)`
        header: String,
        /// Guarded statement
        statement: Box<Statement>,
    },
}

impl Statement {
    /// One line
    pub fn line(text: impl Into<String>) -> Self {
        Statement::Line(text.into())
    }

    /// Split a multi-line template into line statements, keeping relative
    /// indentation and turning empty lines into [`Statement::Blank`]
    pub fn lines(text: &str) -> Vec<Statement> {
        text.lines()
            .map(|l| {
                if l.trim().is_empty() {
                    Statement::Blank
                } else {
                    Statement::Line(l.trim_end().to_string())
                }
            })
            .collect()
    }

    fn render(&self, ctx: &mut RenderContext<'_>) {
        match self {
            Statement::Line(text) => ctx.line(text),
            Statement::Blank => ctx.blank_line(),
            Statement::Block { header, body } => {
                ctx.line(&format!("{} {{", header));
                ctx.indent();
                for s in body {
                    s.render(ctx);
                }
                ctx.dedent();
                ctx.line("}");
            }
            Statement::Guard { header, statement } => {
                ctx.line(header);
                ctx.indent();
                statement.render(ctx);
                ctx.dedent();
            }
        }
    }
}

/// Function definition
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Signature
    pub signature: Signature,
    /// Body statements
    pub body: Vec<Statement>,
}

impl Function {
    /// Function with the given body
    pub fn new(signature: Signature, body: Vec<Statement>) -> Self {
        Function { signature, body }
    }

    /// Function name
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    fn render(&self, ctx: &mut RenderContext<'_>) {
        ctx.line(&format!("{} {{", self.signature));
        ctx.indent();
        for s in &self.body {
            s.render(ctx);
        }
        ctx.dedent();
        ctx.line("}");
    }
}

/// Ordered list of top-level items
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    items: Vec<Item>,
}

impl Program {
    /// Empty program
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item
    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Append several items
    pub fn extend<I: IntoIterator<Item = Item>>(&mut self, items: I) {
        self.items.extend(items);
    }

    /// Items in program order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Function definitions in program order
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(f) => Some(f),
            _ => None,
        })
    }

    /// Function definition by name
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions().find(|f| f.name() == name)
    }

    /// Position of a function definition among all items
    pub fn position(&self, name: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| matches!(item, Item::Function(f) if f.name() == name))
    }

    /// Render the whole program
    pub fn to_glsl(&self) -> String {
        let mut out = String::new();
        let mut ctx = RenderContext::new(&mut out);
        let mut previous: Option<&Item> = None;
        for item in &self.items {
            if let Some(prev) = previous {
                let same_group = prev.group().is_some() && prev.group() == item.group();
                if !same_group {
                    ctx.blank_line();
                }
            }
            item.render(&mut ctx);
            previous = Some(item);
        }
        out
    }
}

struct RenderContext<'a> {
    out: &'a mut String,
    indent: usize,
}

impl<'a> RenderContext<'a> {
    fn new(out: &'a mut String) -> Self {
        Self { out, indent: 0 }
    }

    fn indent(&mut self) {
        self.indent += 1;
    }

    fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        writeln!(self.out, "{}", text).unwrap();
    }

    fn blank_line(&mut self) {
        self.out.push('\n');
    }
}
