// nucleotide.rs - Nucleotide allele codes and IUPAC call parsing for SNP sites

use crate::data::site::UNKNOWN_ALLELE;

pub const A_ALLELE: u8 = 0;
pub const C_ALLELE: u8 = 1;
pub const G_ALLELE: u8 = 2;
pub const T_ALLELE: u8 = 3;
pub const INSERT_ALLELE: u8 = 4;
pub const GAP_ALLELE: u8 = 5;

const ALLELE_CHARS: [char; 6] = ['A', 'C', 'G', 'T', '+', '-'];

/// Code for a single nucleotide character. `N` and `.` map to the missing
/// sentinel; anything unrecognized returns `None`.
pub fn allele_code(c: char) -> Option<u8> {
    match c.to_ascii_uppercase() {
        'A' => Some(A_ALLELE),
        'C' => Some(C_ALLELE),
        'G' => Some(G_ALLELE),
        'T' => Some(T_ALLELE),
        '+' => Some(INSERT_ALLELE),
        '-' => Some(GAP_ALLELE),
        'N' | '.' => Some(UNKNOWN_ALLELE),
        _ => None,
    }
}

pub fn allele_char(code: u8) -> char {
    ALLELE_CHARS.get(code as usize).copied().unwrap_or('N')
}

/// Diploid values for a single IUPAC letter
fn iupac_pair(c: char) -> Option<[u8; 2]> {
    let pair = match c.to_ascii_uppercase() {
        'R' => [A_ALLELE, G_ALLELE],
        'Y' => [C_ALLELE, T_ALLELE],
        'S' => [C_ALLELE, G_ALLELE],
        'W' => [A_ALLELE, T_ALLELE],
        'K' => [G_ALLELE, T_ALLELE],
        'M' => [A_ALLELE, C_ALLELE],
        '0' => [INSERT_ALLELE, GAP_ALLELE],
        other => {
            let code = allele_code(other)?;
            [code, code]
        }
    };
    Some(pair)
}

/// Parse a diploid nucleotide call.
///
/// Accepts one IUPAC letter (`A`, `R`, `N`), two letters (`AG`, `NN`) or a
/// separated pair (`A/G`, `A|G`, `./.`). Empty strings are missing.
pub fn parse_diploid_call(call: &str) -> Option<[u8; 2]> {
    let call = call.trim();
    if call.is_empty() {
        return Some([UNKNOWN_ALLELE; 2]);
    }

    let parts: Vec<&str> = call.split(['/', '|']).collect();
    let chars: Vec<char> = match parts.len() {
        1 => call.chars().collect(),
        2 => {
            let mut chars = Vec::with_capacity(2);
            for part in parts {
                let mut it = part.chars();
                match (it.next(), it.next()) {
                    (Some(c), None) => chars.push(c),
                    _ => return None,
                }
            }
            chars
        }
        _ => return None,
    };

    match chars.as_slice() {
        [single] => iupac_pair(*single),
        [first, second] => Some([allele_code(*first)?, allele_code(*second)?]),
        _ => None,
    }
}

/// Render a diploid pair as an IUPAC letter. Pairs with one missing copy
/// have no IUPAC letter and are written as two characters.
pub fn diploid_iupac(pair: [u8; 2]) -> String {
    let [a, b] = pair;
    if a == UNKNOWN_ALLELE && b == UNKNOWN_ALLELE {
        return "N".to_string();
    }
    if a == b {
        return allele_char(a).to_string();
    }
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let letter = match (lo, hi) {
        (A_ALLELE, G_ALLELE) => Some('R'),
        (C_ALLELE, T_ALLELE) => Some('Y'),
        (C_ALLELE, G_ALLELE) => Some('S'),
        (A_ALLELE, T_ALLELE) => Some('W'),
        (G_ALLELE, T_ALLELE) => Some('K'),
        (A_ALLELE, C_ALLELE) => Some('M'),
        (INSERT_ALLELE, GAP_ALLELE) => Some('0'),
        _ => None,
    };
    match letter {
        Some(c) => c.to_string(),
        None => format!("{}{}", allele_char(a), allele_char(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call_forms() {
        assert_eq!(parse_diploid_call("A"), Some([A_ALLELE, A_ALLELE]));
        assert_eq!(parse_diploid_call("R"), Some([A_ALLELE, G_ALLELE]));
        assert_eq!(parse_diploid_call("CT"), Some([C_ALLELE, T_ALLELE]));
        assert_eq!(parse_diploid_call("C/T"), Some([C_ALLELE, T_ALLELE]));
        assert_eq!(parse_diploid_call("g|a"), Some([G_ALLELE, A_ALLELE]));
        assert_eq!(parse_diploid_call("./."), Some([UNKNOWN_ALLELE; 2]));
        assert_eq!(parse_diploid_call("N"), Some([UNKNOWN_ALLELE; 2]));
        assert_eq!(parse_diploid_call(""), Some([UNKNOWN_ALLELE; 2]));
        assert_eq!(parse_diploid_call("X"), None);
        assert_eq!(parse_diploid_call("ACG"), None);
        assert_eq!(parse_diploid_call("AC/G"), None);
    }

    #[test]
    fn test_iupac_rendering() {
        assert_eq!(diploid_iupac([A_ALLELE, A_ALLELE]), "A");
        assert_eq!(diploid_iupac([G_ALLELE, A_ALLELE]), "R");
        assert_eq!(diploid_iupac([UNKNOWN_ALLELE, UNKNOWN_ALLELE]), "N");
        assert_eq!(diploid_iupac([A_ALLELE, UNKNOWN_ALLELE]), "AN");
    }
}
