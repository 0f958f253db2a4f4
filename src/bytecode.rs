use serde::{Deserialize, Serialize};

use crate::tokenizer::NumberLiteral;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpCode {
    #[serde(rename = "load.local")]
    LoadLocal,
    #[serde(rename = "load.member")]
    LoadMember,
    #[serde(rename = "load.num")]
    LoadNum,
    #[serde(rename = "load.string")]
    LoadString,
    #[serde(rename = "math.add")]
    Add,
    #[serde(rename = "math.sub")]
    Subtract,
    #[serde(rename = "math.mul")]
    Multiply,
    #[serde(rename = "math.div")]
    Divide,
    #[serde(rename = "math.mod")]
    Modulo,
    #[serde(rename = "cmp.greater")]
    Greater,
    #[serde(rename = "cmp.less")]
    Less,
    #[serde(rename = "cmp.equal")]
    Equal,
    #[serde(rename = "cmp.eq_or_greater")]
    EqualOrGreater,
    #[serde(rename = "cmp.eq_or_less")]
    EqualOrLess,
    #[serde(rename = "store.local")]
    StoreLocal,
    #[serde(rename = "stack.pop.one")]
    PopOne,
    #[serde(rename = "flow.reljmpfalse")]
    RelativeJumpIfFalse,
    #[serde(rename = "flow.reljmp")]
    RelativeJump,
    #[serde(rename = "invoke")]
    Invoke,
    #[serde(rename = "return")]
    Return,
}

impl OpCode {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            OpCode::LoadLocal => "load.local",
            OpCode::LoadMember => "load.member",
            OpCode::LoadNum => "load.num",
            OpCode::LoadString => "load.string",
            OpCode::Add => "math.add",
            OpCode::Subtract => "math.sub",
            OpCode::Multiply => "math.mul",
            OpCode::Divide => "math.div",
            OpCode::Modulo => "math.mod",
            OpCode::Greater => "cmp.greater",
            OpCode::Less => "cmp.less",
            OpCode::Equal => "cmp.equal",
            OpCode::EqualOrGreater => "cmp.eq_or_greater",
            OpCode::EqualOrLess => "cmp.eq_or_less",
            OpCode::StoreLocal => "store.local",
            OpCode::PopOne => "stack.pop.one",
            OpCode::RelativeJumpIfFalse => "flow.reljmpfalse",
            OpCode::RelativeJump => "flow.reljmp",
            OpCode::Invoke => "invoke",
            OpCode::Return => "return",
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Name(String),
    Number(NumberLiteral),
    String(String),
    /// Relative count of instructions, taken from the jump's own index.
    Jump(i64),
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Name(name) => write!(f, "{name}"),
            Operand::Number(number) => write!(f, "{number}"),
            Operand::String(s) => write!(f, "{s:?}"),
            Operand::Jump(offset) => write!(f, "{offset}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: OpCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operand: Option<Operand>,
}

impl Instruction {
    pub fn simple(opcode: OpCode) -> Self {
        Self {
            opcode,
            operand: None,
        }
    }

    pub fn with_operand(opcode: OpCode, operand: Operand) -> Self {
        Self {
            opcode,
            operand: Some(operand),
        }
    }

    pub fn load_local(name: impl Into<String>) -> Self {
        Self::with_operand(OpCode::LoadLocal, Operand::Name(name.into()))
    }

    pub fn load_member(name: impl Into<String>) -> Self {
        Self::with_operand(OpCode::LoadMember, Operand::Name(name.into()))
    }

    pub fn load_num(number: NumberLiteral) -> Self {
        Self::with_operand(OpCode::LoadNum, Operand::Number(number))
    }

    pub fn load_string(text: impl Into<String>) -> Self {
        Self::with_operand(OpCode::LoadString, Operand::String(text.into()))
    }

    pub fn store_local(name: impl Into<String>) -> Self {
        Self::with_operand(OpCode::StoreLocal, Operand::Name(name.into()))
    }

    pub fn invoke(name: impl Into<String>) -> Self {
        Self::with_operand(OpCode::Invoke, Operand::Name(name.into()))
    }

    pub fn jump_if_false(offset: usize) -> Self {
        Self::with_operand(OpCode::RelativeJumpIfFalse, Operand::Jump(offset as i64))
    }

    pub fn jump(offset: usize) -> Self {
        Self::with_operand(OpCode::RelativeJump, Operand::Jump(offset as i64))
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.operand {
            Some(operand) => write!(f, "{}({})", self.opcode, operand),
            None => write!(f, "{}", self.opcode),
        }
    }
}

/// The flat instruction list of one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledFunction {
    pub name: String,
    pub instructions: Vec<Instruction>,
}

impl CompiledFunction {
    pub fn disassemble(&self) -> String {
        let mut out = format!("== {} ==\n", self.name);
        for (offset, instruction) in self.instructions.iter().enumerate() {
            out.push_str(&format!("{:04} {:<18}", offset, instruction.opcode.mnemonic()));
            if let Some(operand) = &instruction.operand {
                out.push_str(&format!(" {operand}"));
                if let Operand::Jump(relative) = operand {
                    out.push_str(&format!(" -> {:04}", offset as i64 + relative));
                }
            }
            out.push('\n');
        }
        out
    }
}
