use proc_macro2;
use syn::{parse_macro_input, parse_quote, Data, DeriveInput, GenericParam, Generics};

mod structs;
use structs::derive_struct;
mod enums;
use enums::derive_enum;

#[proc_macro_derive(Dump, attributes(dump_with))]
pub fn dump(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	dump_impl(input).into()
}

fn dump_impl(input: DeriveInput) -> proc_macro2::TokenStream {
	let generics = input.generics;
	let generics_for_impl = get_generics(&generics);

	match input.data {
		Data::Struct(data) => derive_struct(data, input.ident, generics, generics_for_impl),
		Data::Enum(data) => derive_enum(data, input.ident, generics, generics_for_impl),
		Data::Union(_) => todo!("Deriving `Dump` on Unions not supported"),
	}
}

/// Amend generics to add `Dump` trait bound on every type param,
/// so e.g. `struct Wrapper<T>(DVec<T>)` derives `impl<T: Dump> Dump`.
fn get_generics(generics: &Generics) -> Generics {
	let mut generics_for_impl = generics.clone();
	for param in generics_for_impl.params.iter_mut() {
		if let GenericParam::Type(type_param) = param {
			type_param.bounds.push(parse_quote!(::dumpable::Dump));
		}
	}
	generics_for_impl
}
