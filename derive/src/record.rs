use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Error, Field, Fields, GenericArgument, GenericParam, Ident, PathArguments,
    Result, Type, parse_quote, spanned::Spanned,
};

use crate::attribute::{Decoder, FieldAttribute, RecordAttribute};

pub(crate) fn expand_record(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        Err(Error::new(
            input.span(),
            "`Record` may only be derived on structs.",
        ))?
    };

    let Fields::Named(fields) = &data.fields else {
        Err(Error::new(
            input.span(),
            "`Record` may only be derived on structs with named fields.",
        ))?
    };

    if let Some(lifetime) = input
        .generics
        .params
        .iter()
        .find(|p| matches!(p, GenericParam::Lifetime(_)))
    {
        Err(Error::new_spanned(
            lifetime,
            "`Record` cannot be derived on structs borrowing data.",
        ))?
    }

    let fields = fields
        .named
        .iter()
        .map(FieldMetadata::parse)
        .collect::<Result<Vec<_>>>()?;

    let RecordAttribute { decoders } = RecordAttribute::from_attrs(&input.attrs)?;

    let name = &input.ident;
    let record_name = name.to_string();
    let field_names = fields.iter().map(|f| f.name.to_string());

    // Bound field types only for generic records; concrete ones are checked
    // where the impls use them.
    let mut generics = input.generics.clone();
    if generics.type_params().next().is_some() {
        let predicates = &mut generics.make_where_clause().predicates;
        for field in &fields {
            let ty = &field.ty;
            predicates.push(if field.skip {
                parse_quote! { #ty: ::core::default::Default }
            } else {
                parse_quote! { #ty: ::bytebind::Decode }
            });
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let directive_cases = fields.iter().enumerate().map(|(index, field)| {
        let directive = &field.directive;
        quote! { #index => ::core::result::Result::Ok(#directive), }
    });

    let field_cases = fields
        .iter()
        .enumerate()
        .filter(|(_, field)| !field.skip)
        .map(|(index, field)| {
            let member = &field.name;
            quote! {
                #index => ::bytebind::engine::decode_member(
                    self,
                    |record: &mut Self| &mut record.#member,
                    directive,
                    r,
                    ancestors,
                ),
            }
        });

    let zero_fields = fields.iter().map(|field| {
        let member = &field.name;
        let ty = &field.ty;
        if field.skip {
            quote! { #member: ::core::default::Default::default() }
        } else {
            quote! { #member: <#ty as ::bytebind::Decode>::zero() }
        }
    });

    let delegate_methods = expand_decoders(&decoders);

    let expanded = quote! {
        impl #impl_generics ::bytebind::Record for #name #ty_generics #where_clause {
            const NAME: &'static str = #record_name;
            const FIELDS: &'static [&'static str] = &[#(#field_names),*];

            #[allow(unused_variables)]
            fn directive(
                &self,
                field: usize,
            ) -> ::core::result::Result<::bytebind::Directive, ::bytebind::DirectiveError> {
                match field {
                    #(#directive_cases)*
                    _ => ::core::result::Result::Ok(::bytebind::Directive::new().ignore()),
                }
            }

            #[allow(unused_variables)]
            fn decode_field(
                &mut self,
                field: usize,
                directive: &::bytebind::Directive,
                r: &mut dyn ::bytebind::Reader,
                ancestors: &mut dyn ::bytebind::Scope,
            ) -> ::core::result::Result<(), ::bytebind::Error> {
                match field {
                    #(#field_cases)*
                    _ => ::core::result::Result::Ok(()),
                }
            }
        }

        impl #impl_generics ::bytebind::Decode for #name #ty_generics #where_clause {
            fn zero() -> Self {
                Self {
                    #(#zero_fields),*
                }
            }

            fn decode(
                &mut self,
                _: &::bytebind::Directive,
                r: &mut dyn ::bytebind::Reader,
                scope: &mut dyn ::bytebind::Scope,
            ) -> ::core::result::Result<(), ::bytebind::Error> {
                ::bytebind::engine::decode_record(self, r, scope)
            }
        }

        impl #impl_generics ::bytebind::Delegate for #name #ty_generics #where_clause {
            fn record_name(&self) -> &'static str {
                <Self as ::bytebind::Record>::NAME
            }

            #delegate_methods
        }
    };

    Ok(expanded.into())
}

/// Dispatch methods for the routines a record declares, one per shape.
fn expand_decoders(decoders: &[Decoder]) -> proc_macro2::TokenStream {
    let (values, updates): (Vec<_>, Vec<_>) = decoders.iter().partition(|d| d.output.is_some());

    let update_method = (!updates.is_empty()).then(|| {
        let cases = updates.iter().map(|Decoder { method, .. }| {
            let routine = method.to_string();
            quote! {
                #routine => ::core::option::Option::Some(
                    Self::#method(self, r).map_err(::core::convert::Into::into)
                ),
            }
        });

        quote! {
            fn decode_with(
                &mut self,
                routine: &str,
                r: &mut dyn ::bytebind::Reader,
            ) -> ::core::option::Option<::core::result::Result<(), ::bytebind::Error>> {
                match routine {
                    #(#cases)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    });

    let value_method = (!values.is_empty()).then(|| {
        let cases = values.iter().map(|Decoder { method, output }| {
            let routine = method.to_string();
            quote! {
                #routine if target == ::core::any::TypeId::of::<#output>() => ::core::option::Option::Some(
                    Self::#method(self, r)
                        .map(::bytebind::delegate::into_value::<#output>)
                        .map_err(::core::convert::Into::into)
                ),
            }
        });

        quote! {
            fn decode_value(
                &mut self,
                routine: &str,
                r: &mut dyn ::bytebind::Reader,
                target: ::core::any::TypeId,
            ) -> ::core::option::Option<
                ::core::result::Result<::bytebind::delegate::Value, ::bytebind::Error>,
            > {
                match routine {
                    #(#cases)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    });

    quote! {
        #update_method
        #value_method
    }
}

#[derive(Debug)]
struct FieldMetadata {
    name: Ident,
    ty: Type,
    skip: bool,
    directive: proc_macro2::TokenStream,
}

impl FieldMetadata {
    fn parse(field: &Field) -> Result<Self> {
        let Some(name) = field.ident.clone() else {
            Err(Error::new_spanned(field, "Field must be named."))?
        };

        let attribute = FieldAttribute::from_attrs(&field.attrs)?;
        let skip = attribute.skip.is_some();

        // Skipped fields only need a default, so any type will do.
        if !skip {
            check_type(&field.ty)?;
        }

        Ok(Self {
            name,
            ty: field.ty.clone(),
            skip,
            directive: attribute.directive(),
        })
    }
}

/// Reject field types that cannot hold decoded data.
fn check_type(ty: &Type) -> Result<()> {
    let kind = match ty {
        Type::Array(array) => return check_type(&array.elem),
        Type::Group(group) => return check_type(&group.elem),
        Type::Paren(paren) => return check_type(&paren.elem),
        Type::Path(path) => {
            for segment in &path.path.segments {
                let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
                    continue;
                };
                for argument in &arguments.args {
                    if let GenericArgument::Type(inner) = argument {
                        check_type(inner)?;
                    }
                }
            }
            return Ok(());
        }
        Type::Reference(_) => "a reference",
        Type::Ptr(_) => "a raw pointer",
        Type::Tuple(_) => "a tuple",
        Type::Slice(_) => "an unsized slice",
        Type::BareFn(_) => "a function pointer",
        Type::TraitObject(_) | Type::ImplTrait(_) => "a trait object",
        Type::Never(_) => "the never type",
        _ => "an unsupported type",
    };

    Err(Error::new_spanned(
        ty,
        format!("Field cannot be decoded: found {kind}. Use `#[bin(skip)]` to leave it out."),
    ))
}
