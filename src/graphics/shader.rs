use vecmap::VecSet;
use derive_more::*;

/// Stores flags that are used during shader preprocessing.
/// These flags determine if `#ifdef` blocks get included or stripped out in the final shader.
/// Supported directives: `#ifdef NAME`, `#ifndef NAME`, `#else` and `#endif`.
pub struct ShaderPreprocessor(VecSet<String>);

impl Default for ShaderPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderPreprocessor {

    pub fn new() -> Self {
        Self(VecSet::new())
    }

    pub fn add(&mut self, shader_def: impl Into<String>) {
        self.0.insert(shader_def.into());
    }

    pub fn is_defined(&self, def: impl AsRef<str>) -> bool {
        self.0.contains(def.as_ref())
    }

    /**
     * Preprocesses shader code, keeping lines whose enclosing blocks are all active.
     */
    pub fn preprocess(&self, shader_template: &str) -> Result<String, ShaderDefError> {
        let mut blocks: Vec<Block> = Vec::new();
        let mut lines = Vec::new();
        for (idx, line) in shader_template.split('\n').enumerate() {
            let line_num = idx as u32 + 1;
            let trim_line = line.trim();
            if !trim_line.starts_with('#') {
                if blocks.iter().all(|block| block.active) {
                    lines.push(line);
                }
                continue;
            }
            let (command, param) = trim_line.split_once(' ').unwrap_or((trim_line, ""));
            let param = param.trim();
            let error = |kind| ShaderDefError::new(line_num, kind);
            match command {
                "#ifdef" | "#ifndef" => {
                    if param.is_empty() {
                        return Err(error(ShaderDefErrorKind::MissingParam));
                    }
                    let condition = self.is_defined(param) == (command == "#ifdef");
                    let parent_active = blocks.iter().all(|block| block.active);
                    blocks.push(Block { condition, parent_active, active: parent_active && condition, in_else: false });
                },
                "#else" | "#endif" if !param.is_empty() => return Err(error(ShaderDefErrorKind::UnexpectedParam)),
                "#else" => {
                    let Some(block) = blocks.last_mut() else {
                        return Err(error(ShaderDefErrorKind::NotInsideIfdefBlock));
                    };
                    if block.in_else {
                        return Err(error(ShaderDefErrorKind::DuplicateElse));
                    }
                    block.in_else = true;
                    block.active = block.parent_active && !block.condition;
                },
                "#endif" => {
                    if blocks.pop().is_none() {
                        return Err(error(ShaderDefErrorKind::UnexpectedEndif));
                    }
                },
                _ => return Err(error(ShaderDefErrorKind::InvalidCommand)),
            }
        }
        if !blocks.is_empty() {
            let line_num = shader_template.split('\n').count() as u32;
            return Err(ShaderDefError::new(line_num, ShaderDefErrorKind::MissingEndif));
        }
        Ok(lines.join("\n"))
    }
}

struct Block {
    condition: bool,
    parent_active: bool,
    active: bool,
    in_else: bool,
}


#[derive(Error, Copy, Clone, Eq, PartialEq, Display, Debug)]
#[display(fmt="Preprocessing error on line {line_num}: {kind}")]
pub struct ShaderDefError {
    pub line_num: u32,
    pub kind: ShaderDefErrorKind,
}

impl ShaderDefError {
    pub fn new(line_num: u32, kind: ShaderDefErrorKind) -> Self {
        Self { line_num, kind }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Display, Debug)]
pub enum ShaderDefErrorKind {
    #[display(fmt="Invalid command")]
    InvalidCommand,
    #[display(fmt="Missing param")]
    MissingParam,
    #[display(fmt="Invalid param")]
    UnexpectedParam,
    #[display(fmt="Not inside of an #ifdef block")]
    NotInsideIfdefBlock,
    #[display(fmt="Second #else in the same block")]
    DuplicateElse,
    #[display(fmt="Missing #endif at the end of the file")]
    MissingEndif,
    #[display(fmt="Unexpected #endif")]
    UnexpectedEndif,
}
