use super::tree::{Binary, Dice, Die, Eval, Face, Grouping, Literal, Render, Roll, RollTree, Set, Unary};
use super::RResult;
use crate::common::{Int, Operator, Sides};

/// Renders a roll tree as text.
///
/// Every method has a plain-text default; implementors override the pieces
/// they want to decorate.
pub trait Stringify {
    fn stringify<R: Render>(&mut self, node: &R) -> RResult<String> {
        node.render(self)
    }

    fn str_roll(&mut self, roll: &Roll<'_>) -> RResult<String> {
        let tree = self.stringify(&roll.tree)?;
        Ok(format!("{} = {}", tree, roll.total()?.as_int()))
    }

    fn str_roll_tree(&mut self, tree: &RollTree<'_>) -> RResult<String> {
        let mut out = self.stringify(&tree.node)?;
        for annotation in &tree.annotations {
            out.push_str(&format!(" [{}]", annotation));
        }
        Ok(out)
    }

    fn str_literal(&mut self, literal: &Literal) -> RResult<String> {
        Ok(literal.0.to_string())
    }

    fn str_set(&mut self, set: &Set<'_>) -> RResult<String> {
        let items = join(self, &set.items)?;
        // one item keeps its trailing comma so it still reads as a set
        let comma = if set.items.len() == 1 { "," } else { "" };
        Ok(format!("({}{}){}", items, comma, operators(&set.ops)))
    }

    fn str_dice(&mut self, dice: &Dice) -> RResult<String> {
        let rolled = join(self, &dice.rolled)?;
        Ok(format!(
            "{}d{}{} ({})",
            dice.num,
            dice.sides,
            operators(&dice.ops),
            rolled
        ))
    }

    fn str_die(&mut self, die: &Die) -> RResult<String> {
        let faces: Vec<_> = die.faces.iter().map(|face| self.str_face(face)).collect();
        Ok(faces.join(", "))
    }

    fn str_face(&mut self, face: &Face) -> String {
        let mut out = history(&face.history);
        if face.exploded {
            out.push('!');
        }
        out
    }

    fn str_grouping(&mut self, grouping: &Grouping<'_>) -> RResult<String> {
        Ok(format!("({})", self.stringify(&*grouping.0)?))
    }

    fn str_unary(&mut self, unary: &Unary<'_>) -> RResult<String> {
        Ok(format!("{}{}", unary.op, self.stringify(&*unary.operand)?))
    }

    fn str_binary(&mut self, binary: &Binary<'_>) -> RResult<String> {
        let lhs = self.stringify(&*binary.lhs)?;
        let rhs = self.stringify(&*binary.rhs)?;
        Ok(format!("{} {} {}", lhs, binary.op, rhs))
    }
}

fn join<S: Stringify + ?Sized, R: Render>(s: &mut S, nodes: &[R]) -> RResult<String> {
    let parts = nodes
        .iter()
        .map(|node| s.stringify(node))
        .collect::<RResult<Vec<_>>>()?;
    Ok(parts.join(", "))
}

fn operators(ops: &[Operator]) -> String {
    ops.iter().map(ToString::to_string).collect()
}

fn history(values: &[Int]) -> String {
    let values: Vec<_> = values.iter().map(ToString::to_string).collect();
    values.join(" -> ")
}

/// `1d20 (7) + 2 = 9`
#[derive(Debug, Default)]
pub struct SimpleStringifier;

impl Stringify for SimpleStringifier {}

/// Chat markdown: dropped values are struck through, ones and maximum faces
/// are bolded and the total is set in backticks.
///
/// The verbose form prints the roll's comment (or `Result`) as a bold title
/// and the total on its own line.
#[derive(Debug, Default)]
pub struct MarkdownStringifier {
    in_dropped: bool,
    verbose: bool,
}

impl MarkdownStringifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose() -> Self {
        Self {
            in_dropped: false,
            verbose: true,
        }
    }

    fn face(&self, face: &Face, sides: Sides) -> String {
        let last = face.value();
        let mut out = String::new();
        for value in &face.history[..face.history.len() - 1] {
            out.push_str(&format!("{} -> ", value));
        }

        let bang = if face.exploded { "!" } else { "" };
        let crit = last == 1 || matches!(sides, Sides::Poly(n) if last == Int::from(n.get()));
        if crit {
            out.push_str(&format!("**{}{}**", last, bang));
        } else {
            out.push_str(&format!("{}{}", last, bang));
        }

        if face.kept || self.in_dropped {
            out
        } else {
            format!("~~{}~~", out)
        }
    }
}

impl Stringify for MarkdownStringifier {
    fn stringify<R: Render>(&mut self, node: &R) -> RResult<String> {
        if node.kept() || self.in_dropped {
            return node.render(self);
        }
        self.in_dropped = true;
        let inside = node.render(self);
        self.in_dropped = false;
        Ok(format!("~~{}~~", inside?))
    }

    fn str_roll(&mut self, roll: &Roll<'_>) -> RResult<String> {
        let tree = self.stringify(&roll.tree)?;
        let total = roll.total()?.as_int();
        Ok(if self.verbose {
            let title = roll.comment().unwrap_or("Result");
            format!("**{}**: {}\n**Total**: {}", title, tree, total)
        } else {
            format!("{} = `{}`", tree, total)
        })
    }

    fn str_die(&mut self, die: &Die) -> RResult<String> {
        let faces: Vec<_> = die.faces.iter().map(|face| self.face(face, die.sides)).collect();
        Ok(faces.join(", "))
    }
}
