use proc_macro2::{Ident, Span, TokenStream, TokenTree};
use proc_macro_crate::FoundCrate;
use quote::{quote, quote_spanned, ToTokens};
use syn::spanned::Spanned;
use syn::{
    parse_macro_input, parse_quote, Data, DeriveInput, Field, Fields, GenericParam, Generics,
    Index, Member, Type,
};

fn crate_name() -> TokenStream {
    let pegparse =
        proc_macro_crate::crate_name("pegparse").expect("pegparse is present in `Cargo.toml`");
    match pegparse {
        FoundCrate::Itself => quote!(crate),
        FoundCrate::Name(name) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!( #ident )
        }
    }
}

/// Derives `pegparse::Span`.
///
/// For structs, the span is taken from (in order of preference):
/// - the field marked `#[span]`,
/// - the `start` and `end` fields,
/// - the start of the first field and the end of the last field.
///
/// For enums, every variant must have exactly one field, which the span is delegated to.
#[proc_macro_derive(Span, attributes(span))]
pub fn derive_span_trait(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_span(input) {
        Ok(expanded) => proc_macro::TokenStream::from(expanded),
        Err(e) => proc_macro::TokenStream::from(e.to_compile_error()),
    }
}

fn expand_span(input: DeriveInput) -> syn::Result<TokenStream> {
    let pegparse = crate_name();
    let name = &input.ident;
    let SpanBody { start, end, bounded } = match &input.data {
        Data::Struct(data) => struct_span_body(&input, &data.fields)?,
        Data::Enum(data) => {
            let mut bounded = Vec::new();
            let mut start_arms = Vec::new();
            let mut end_arms = Vec::new();
            for variant in &data.variants {
                let variant_name = &variant.ident;
                let field = match &variant.fields {
                    Fields::Unnamed(fields) if fields.unnamed.len() == 1 => &fields.unnamed[0],
                    _ => {
                        return Err(syn::Error::new(
                            variant.span(),
                            "`Span` can only be derived for variants with exactly one unnamed field",
                        ))
                    }
                };
                bounded.push(field.ty.clone());
                start_arms.push(quote_spanned! { variant.span() =>
                    Self::#variant_name(x) => #pegparse::Span::start_position(x),
                });
                end_arms.push(quote_spanned! { variant.span() =>
                    Self::#variant_name(x) => #pegparse::Span::end_position(x),
                });
            }
            SpanBody {
                start: quote! { match self { #(#start_arms)* } },
                end: quote! { match self { #(#end_arms)* } },
                bounded,
            }
        }
        Data::Union(_) => {
            return Err(syn::Error::new(
                input.span(),
                "`Span` cannot be derived for unions",
            ))
        }
    };

    let generics = add_span_trait_bounds(input.generics.clone(), &bounded);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics #pegparse::Span for #name #ty_generics #where_clause {
            fn start_position(&self) -> #pegparse::Position {
                #start
            }
            fn end_position(&self) -> #pegparse::Position {
                #end
            }
        }
    })
}

struct SpanBody {
    start: TokenStream,
    end: TokenStream,
    // Field types whose `Span` impls the generated code relies on.
    bounded: Vec<Type>,
}

fn struct_span_body(input: &DeriveInput, fields: &Fields) -> syn::Result<SpanBody> {
    let pegparse = crate_name();
    let members: Vec<(Member, &Field)> = fields
        .iter()
        .enumerate()
        .map(|(i, f)| match &f.ident {
            Some(ident) => (Member::Named(ident.clone()), f),
            None => (Member::Unnamed(Index::from(i)), f),
        })
        .collect();

    let marked: Vec<_> = members
        .iter()
        .filter(|(_, f)| f.attrs.iter().any(|a| a.path.is_ident("span")))
        .collect();
    let (start, end) = match marked.as_slice() {
        [field] => (*field, *field),
        [] => {
            let named = |name: &str| {
                members
                    .iter()
                    .find(|(m, _)| matches!(m, Member::Named(ident) if ident == name))
            };
            match (named("start"), named("end"), members.first(), members.last()) {
                (Some(start), Some(end), _, _) => (start, end),
                (_, _, Some(first), Some(last)) => (first, last),
                _ => {
                    return Err(syn::Error::new(
                        input.span(),
                        "`Span` cannot be derived for structs without fields",
                    ))
                }
            }
        }
        [_, second, ..] => {
            return Err(syn::Error::new(
                second.1.span(),
                "only one field can be marked `#[span]`",
            ))
        }
    };

    let (start_member, start_field) = start;
    let (end_member, end_field) = end;
    Ok(SpanBody {
        start: quote! { #pegparse::Span::start_position(&self.#start_member) },
        end: quote! { #pegparse::Span::end_position(&self.#end_member) },
        bounded: vec![start_field.ty.clone(), end_field.ty.clone()],
    })
}

fn add_span_trait_bounds(mut generics: Generics, bounded: &[Type]) -> Generics {
    let pegparse = crate_name();
    let params: Vec<Ident> = generics
        .params
        .iter()
        .filter_map(|param| match param {
            GenericParam::Type(type_param) => Some(type_param.ident.clone()),
            _ => None,
        })
        .collect();
    let where_clause = generics.make_where_clause();
    for ty in bounded {
        if mentions_any(ty.to_token_stream(), &params) {
            where_clause
                .predicates
                .push(parse_quote!(#ty: #pegparse::Span));
        }
    }
    generics
}

fn mentions_any(tokens: TokenStream, params: &[Ident]) -> bool {
    tokens.into_iter().any(|token| match token {
        TokenTree::Ident(ident) => params.contains(&ident),
        TokenTree::Group(group) => mentions_any(group.stream(), params),
        _ => false,
    })
}
