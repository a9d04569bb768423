use crate::program::CharClass;

/// Characters a class instruction may draw from.
///
/// The alphabet members the class admits, in alphabet order. When there are
/// none, the class's own witness character, so a class outside the alphabet
/// still produces a matching string. `None` when neither exists.
pub fn resolve(class: &CharClass, alphabet: &[char]) -> Option<Vec<char>> {
    let admissible: Vec<char> = alphabet.iter().copied().filter(|&c| class.contains(c)).collect();
    if !admissible.is_empty() {
        return Some(admissible);
    }
    class.witness().map(|c| vec![c])
}
