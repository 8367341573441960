#[cfg(test)]
mod common;

#[cfg(test)]
mod checker_test;


#[cfg(test)]
mod scope_test;

#[cfg(test)]
mod syntax_test;
