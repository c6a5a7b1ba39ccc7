//! Program nodes: the AST the interpreter runs.
//!
//! Scripts reach the engine as trees of `PNode`s. Expressions are literals,
//! identifiers and calls; statements are assignments, control flow and the
//! lineage iteration loops. Every node carries the source line it came from
//! so runtime diagnostics can point at the offending statement.

/// A program node with its source line.
#[derive(Debug, Clone)]
pub struct PNode {
    /// 1-based source line of the construct; 0 when synthesized.
    pub line: usize,
    /// What the node is.
    pub kind: PNodeKind,
}

/// The program node variants.
#[derive(Debug, Clone)]
pub enum PNodeKind {
    /// An integer literal.
    IntLiteral(i64),
    /// A floating literal.
    FloatLiteral(f64),
    /// A string literal. As a statement, its value is written to the
    /// current output.
    StringLiteral(String),
    /// An identifier reference.
    Ident(String),
    /// A call to a built-in function.
    BuiltinCall {
        /// The built-in's name.
        name: String,
        /// The argument expressions.
        args: Vec<PNode>,
    },
    /// A call to a user-defined function.
    FuncCall {
        /// The function's name.
        name: String,
        /// The argument expressions.
        args: Vec<PNode>,
    },
    /// A call to a user-defined procedure.
    ProcCall {
        /// The procedure's name.
        name: String,
        /// The argument expressions.
        args: Vec<PNode>,
    },
    /// A statement list.
    Block(Vec<PNode>),
    /// An assignment to an identifier.
    Assign {
        /// The identifier assigned to.
        ident: String,
        /// The value expression.
        expr: Box<PNode>,
    },
    /// An if statement with an optional else branch.
    If {
        /// The condition.
        cond: Box<PNode>,
        /// The then branch.
        then_branch: Box<PNode>,
        /// The optional else branch.
        else_branch: Option<Box<PNode>>,
    },
    /// A while loop.
    While {
        /// The condition.
        cond: Box<PNode>,
        /// The body.
        body: Box<PNode>,
    },
    /// Iterates the elements of a list.
    ForList {
        /// The list expression.
        list: Box<PNode>,
        /// Bound to each element.
        element: String,
        /// Optionally bound to the 1-based iteration count.
        counter: Option<String>,
        /// The body.
        body: Box<PNode>,
    },
    /// Iterates the elements of a sequence.
    ForSequence {
        /// The sequence expression.
        sequence: Box<PNode>,
        /// Bound to each element, resolved to a person.
        element: String,
        /// Optionally bound to the 1-based iteration count.
        counter: Option<String>,
        /// The body.
        body: Box<PNode>,
    },
    /// Iterates the children of a family.
    ForChildren {
        /// The family expression.
        family: Box<PNode>,
        /// Bound to each child person.
        child: String,
        /// Optionally bound to the 1-based iteration count.
        counter: Option<String>,
        /// The body.
        body: Box<PNode>,
    },
    /// Iterates a person's spouses.
    ForSpouses {
        /// The person expression.
        person: Box<PNode>,
        /// Bound to each spouse person.
        spouse: String,
        /// Optionally bound to the family the spouse was found in.
        family: Option<String>,
        /// Optionally bound to the 1-based iteration count.
        counter: Option<String>,
        /// The body.
        body: Box<PNode>,
    },
    /// Iterates the families a person is a spouse in.
    ForFams {
        /// The person expression.
        person: Box<PNode>,
        /// Bound to each family.
        family: String,
        /// Optionally bound to the 1-based iteration count.
        counter: Option<String>,
        /// The body.
        body: Box<PNode>,
    },
    /// Iterates the families a person is a child in.
    ForFamcs {
        /// The person expression.
        person: Box<PNode>,
        /// Bound to each family.
        family: String,
        /// Optionally bound to the 1-based iteration count.
        counter: Option<String>,
        /// The body.
        body: Box<PNode>,
    },
    /// Traverses a record tree in pre-order.
    Traverse {
        /// The root expression: a record or node value.
        root: Box<PNode>,
        /// Bound to each visited node.
        node: String,
        /// Bound to each visited node's level.
        level: String,
        /// The body.
        body: Box<PNode>,
    },
    /// Terminates the innermost loop.
    Break,
    /// Proceeds to the next iteration of the innermost loop.
    Continue,
    /// Unwinds to the nearest user function or procedure.
    Return(Option<Box<PNode>>),
}

impl PNode {
    /// Creates an integer literal node.
    #[must_use]
    pub fn int(line: usize, value: i64) -> Self {
        PNode {
            line,
            kind: PNodeKind::IntLiteral(value),
        }
    }

    /// Creates a floating literal node.
    #[must_use]
    pub fn float(line: usize, value: f64) -> Self {
        PNode {
            line,
            kind: PNodeKind::FloatLiteral(value),
        }
    }

    /// Creates a string literal node.
    #[must_use]
    pub fn string(line: usize, value: &str) -> Self {
        PNode {
            line,
            kind: PNodeKind::StringLiteral(value.to_string()),
        }
    }

    /// Creates an identifier node.
    #[must_use]
    pub fn ident(line: usize, name: &str) -> Self {
        PNode {
            line,
            kind: PNodeKind::Ident(name.to_string()),
        }
    }

    /// Creates a built-in call node.
    #[must_use]
    pub fn builtin(line: usize, name: &str, args: Vec<PNode>) -> Self {
        PNode {
            line,
            kind: PNodeKind::BuiltinCall {
                name: name.to_string(),
                args,
            },
        }
    }

    /// Creates a user-function call node.
    #[must_use]
    pub fn func_call(line: usize, name: &str, args: Vec<PNode>) -> Self {
        PNode {
            line,
            kind: PNodeKind::FuncCall {
                name: name.to_string(),
                args,
            },
        }
    }

    /// Creates a user-procedure call node.
    #[must_use]
    pub fn proc_call(line: usize, name: &str, args: Vec<PNode>) -> Self {
        PNode {
            line,
            kind: PNodeKind::ProcCall {
                name: name.to_string(),
                args,
            },
        }
    }

    /// Creates a statement block node.
    #[must_use]
    pub fn block(line: usize, statements: Vec<PNode>) -> Self {
        PNode {
            line,
            kind: PNodeKind::Block(statements),
        }
    }

    /// Creates an assignment node.
    #[must_use]
    pub fn assign(line: usize, ident: &str, expr: PNode) -> Self {
        PNode {
            line,
            kind: PNodeKind::Assign {
                ident: ident.to_string(),
                expr: Box::new(expr),
            },
        }
    }

    /// Creates an if node.
    #[must_use]
    pub fn if_stmt(line: usize, cond: PNode, then_branch: PNode, else_branch: Option<PNode>) -> Self {
        PNode {
            line,
            kind: PNodeKind::If {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: else_branch.map(Box::new),
            },
        }
    }

    /// Creates a while node.
    #[must_use]
    pub fn while_stmt(line: usize, cond: PNode, body: PNode) -> Self {
        PNode {
            line,
            kind: PNodeKind::While {
                cond: Box::new(cond),
                body: Box::new(body),
            },
        }
    }

    /// Creates a break node.
    #[must_use]
    pub fn break_stmt(line: usize) -> Self {
        PNode {
            line,
            kind: PNodeKind::Break,
        }
    }

    /// Creates a continue node.
    #[must_use]
    pub fn continue_stmt(line: usize) -> Self {
        PNode {
            line,
            kind: PNodeKind::Continue,
        }
    }

    /// Creates a return node.
    #[must_use]
    pub fn return_stmt(line: usize, expr: Option<PNode>) -> Self {
        PNode {
            line,
            kind: PNodeKind::Return(expr.map(Box::new)),
        }
    }
}

/// A user-defined procedure or function.
#[derive(Debug, Clone)]
pub struct Routine {
    /// The routine's name.
    pub name: String,
    /// The parameter names, bound in call order.
    pub params: Vec<String>,
    /// The body.
    pub body: PNode,
}
