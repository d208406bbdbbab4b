/// The syntactic kind of a [Node](crate::Node).
///
/// The shapes mirror a classic JS compiler tree:
///
/// * `Function`: `[Name, ParamList, Block]`, the name is empty for anonymous functions.
/// * `Var`: one `Name` per binding, each with an optional initializer child.
/// * `GetProp`: `[object]`, the property name is the node's string.
/// * `GetElem`: `[object, index]`.
/// * `Call`/`New`: `[callee, args...]`.
/// * `ObjectLit`: `StringKey`/`GetterDef`/`SetterDef` children, each holding its value.
/// * `Try`: `[Block, Block(catch?), Block(finally)?]` where the second block holds at most one `Catch`.
/// * `Catch`: `[Name, Block]`.
/// * `For`: `[init, cond, incr, body]`, absent clauses are `Empty`.
/// * `ForIn`: `[lhs, object, body]`.
/// * `Do`: `[body, cond]`.
/// * `Label`: `[statement]`, the label is the node's string.
/// * `Break`/`Continue`: no children, the optional label is the node's string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    Root,
    Script,
    Block,

    // Statements
    Var,
    Return,
    If,
    While,
    Do,
    For,
    ForIn,
    Break,
    Continue,
    Label,
    ExprResult,
    Empty,
    Try,
    Catch,
    Throw,
    Switch,
    Case,
    DefaultCase,
    Debugger,

    // Leaves
    Name,
    Number,
    String,
    True,
    False,
    Null,
    This,
    Regexp,

    Function,
    ParamList,

    // Expressions
    Call,
    New,
    GetProp,
    GetElem,
    Assign,
    AssignBitOr,
    AssignBitXor,
    AssignBitAnd,
    AssignLsh,
    AssignRsh,
    AssignUrsh,
    AssignAdd,
    AssignSub,
    AssignMul,
    AssignDiv,
    AssignMod,
    Hook,
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    Ne,
    ShEq,
    ShNe,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    InstanceOf,
    Lsh,
    Rsh,
    Ursh,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Not,
    BitNot,
    Pos,
    Neg,
    TypeOf,
    Void,
    DelProp,
    Inc,
    Dec,
    Comma,
    ArrayLit,
    ObjectLit,
    StringKey,
    GetterDef,
    SetterDef,
}

impl Token {
    pub fn is_assign_op(self) -> bool {
        matches!(
            self,
            Token::AssignBitOr
                | Token::AssignBitXor
                | Token::AssignBitAnd
                | Token::AssignLsh
                | Token::AssignRsh
                | Token::AssignUrsh
                | Token::AssignAdd
                | Token::AssignSub
                | Token::AssignMul
                | Token::AssignDiv
                | Token::AssignMod
        )
    }

    /// Plain or compound assignment.
    pub fn is_assignment(self) -> bool {
        self == Token::Assign || self.is_assign_op()
    }

    pub fn is_object_lit_key(self) -> bool {
        matches!(self, Token::StringKey | Token::GetterDef | Token::SetterDef)
    }

    pub fn is_control_structure(self) -> bool {
        matches!(
            self,
            Token::If
                | Token::For
                | Token::ForIn
                | Token::Do
                | Token::While
                | Token::Label
                | Token::Try
                | Token::Catch
                | Token::Switch
                | Token::Case
                | Token::DefaultCase
        )
    }

    /// Nodes whose children are statements.
    pub fn is_statement_parent(self) -> bool {
        matches!(self, Token::Root | Token::Script | Token::Block | Token::Label)
    }
}
